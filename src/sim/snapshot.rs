//! Read-only view of a match for renderers and tooling

use serde::Serialize;

use super::ballistics::Projectile;
use super::powerups::PowerUp;
use super::state::{GameState, MatchState};
use super::terrain::Platform;
use super::turn::TurnPhase;
use super::units::{Team, TeamId};

#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub phase: TurnPhase,
    pub active: TeamId,
    pub turn_number: u32,
    pub steps_remaining: u32,
    pub max_steps: u32,
    pub countdown_ms: u32,
    pub wind: f32,
}

/// Consistent copy of everything drawable, taken between ticks
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub map: &'static str,
    pub match_state: MatchState,
    pub turn: TurnView,
    pub teams: [Team; 2],
    pub platforms: Vec<Platform>,
    pub projectiles: Vec<Projectile>,
    pub powerups: Vec<PowerUp>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let budget = state.turn.active_budget();
        Self {
            tick: state.time_ticks,
            map: state.settings.map.as_str(),
            match_state: state.match_state,
            turn: TurnView {
                phase: state.turn_phase(),
                active: state.turn.active,
                turn_number: state.turn.turn_number,
                steps_remaining: budget.remaining(),
                max_steps: budget.max(),
                countdown_ms: state.turn.countdown_ms(),
                wind: state.wind,
            },
            teams: state.teams.clone(),
            platforms: state.terrain.intact().cloned().collect(),
            projectiles: state.projectiles.clone(),
            powerups: state.powerups.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchSettings;

    #[test]
    fn test_capture_reflects_state() {
        let state = GameState::new(MatchSettings::default());
        let snapshot = Snapshot::capture(&state);
        assert_eq!(snapshot.turn.phase, TurnPhase::PlayerTurn);
        assert_eq!(snapshot.turn.steps_remaining, 10);
        assert_eq!(snapshot.turn.countdown_ms, 30_000);
        assert_eq!(snapshot.platforms.len(), state.terrain.platforms.len());
        assert_eq!(snapshot.teams[1].units.len(), 4);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(MatchSettings::default());
        let json = Snapshot::capture(&state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["map"], "Plains");
        assert_eq!(value["turn"]["active"], "A");
        assert_eq!(value["teams"][0]["ammo"]["rifle"], 10);
    }
}
