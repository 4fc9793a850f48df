//! Match state and core simulation types
//!
//! Everything the tick mutates lives in `GameState`. Hosts read it (or a
//! `Snapshot`) between ticks and never write to it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ballistics::{Projectile, ProjectileKind};
use super::powerups::{PowerUp, PowerUpKind, PowerUpSpawner};
use super::terrain::Terrain;
use super::tick::{TickInput, tick};
use super::turn::{TurnPhase, TurnState};
use super::units::{Team, TeamId};
use crate::MatchSettings;
use crate::consts::*;

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Playing,
    /// Terminal until restart
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub phase: MatchPhase,
    /// `None` while playing, or after a draw
    pub winner: Option<TeamId>,
    /// 1 for the first match, +1 per restart
    pub round: u32,
}

/// Events emitted by a tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    UnitEliminated { team: TeamId, index: usize },
    Explosion { pos: Vec2, radius: f32 },
    TurnChanged { active: TeamId },
    MatchEnded { winner: Option<TeamId>, scores: [u32; 2] },
    ProjectileFired { id: u32, kind: ProjectileKind, team: TeamId, index: usize },
    /// Bullet or boot hit; `damage` is what was actually dealt
    DirectHit { team: TeamId, index: usize, damage: u32, headshot: bool },
    UnitHealed { team: TeamId, index: usize, amount: u32 },
    PlatformDestroyed { id: u32 },
    PowerUpSpawned { id: u32, kind: PowerUpKind, pos: Vec2 },
    PowerUpCollected { id: u32, kind: PowerUpKind, team: TeamId, index: usize },
}

/// Complete match state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: MatchSettings,
    pub terrain: Terrain,
    pub teams: [Team; 2],
    /// In flight, in launch order
    pub projectiles: Vec<Projectile>,
    pub powerups: Vec<PowerUp>,
    pub spawner: PowerUpSpawner,
    pub turn: TurnState,
    pub match_state: MatchState,
    /// Horizontal launch bias, re-rolled every turn
    pub wind: f32,
    /// Time before the CPU side may attack again
    pub cpu_cooldown: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Unsimulated time carried between `advance` calls
    accumulator: f32,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    pub fn new(settings: MatchSettings) -> Self {
        Self::setup(settings, 1)
    }

    fn setup(settings: MatchSettings, round: u32) -> Self {
        let terrain = Terrain::generate(settings.map);
        let roster = settings.map.roster();
        let team_a = Team::new(
            TeamId::A,
            roster,
            &Terrain::spawn_xs(settings.map, TeamId::A),
            &terrain,
            1,
        );
        let team_b = Team::new(
            TeamId::B,
            roster,
            &Terrain::spawn_xs(settings.map, TeamId::B),
            &terrain,
            1 + roster.len() as u32,
        );

        let mut state = Self {
            terrain,
            teams: [team_a, team_b],
            projectiles: Vec::new(),
            powerups: Vec::new(),
            spawner: PowerUpSpawner::new(settings.powerup_interval_secs),
            turn: TurnState::new(settings.map.max_steps(), settings.turn_time_secs),
            match_state: MatchState {
                phase: MatchPhase::Playing,
                winner: None,
                round,
            },
            wind: 0.0,
            cpu_cooldown: 0.0,
            time_ticks: 0,
            accumulator: 0.0,
            rng: Pcg32::seed_from_u64(settings.seed.wrapping_add(round as u64)),
            next_id: 1 + 2 * roster.len() as u32,
            settings,
        };
        state.reroll_wind();
        if state.is_cpu_controlled(TeamId::A) {
            state.cpu_cooldown = CPU_ACTION_DELAY_SECS;
        }

        log::info!(
            "Round {} on {}: {} units per side, {} steps per turn",
            round,
            state.settings.map.as_str(),
            roster.len(),
            state.settings.map.max_steps()
        );
        state
    }

    /// Throw everything away and start the next round with the same settings
    pub fn restart(&mut self) {
        *self = Self::setup(self.settings.clone(), self.match_state.round + 1);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Team B is always the CPU; team A too under autopilot
    pub fn is_cpu_controlled(&self, team: TeamId) -> bool {
        team == TeamId::B || self.settings.autopilot
    }

    pub fn turn_phase(&self) -> TurnPhase {
        if self.match_state.phase == MatchPhase::GameOver {
            TurnPhase::GameOver
        } else if self.is_cpu_controlled(self.turn.active) {
            TurnPhase::CpuTurn
        } else {
            TurnPhase::PlayerTurn
        }
    }

    pub fn is_over(&self) -> bool {
        self.match_state.phase == MatchPhase::GameOver
    }

    pub fn scores(&self) -> [u32; 2] {
        [self.teams[0].score, self.teams[1].score]
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.index()]
    }

    pub fn reroll_wind(&mut self) {
        self.wind = self.rng.random_range(-WIND_MAX..=WIND_MAX);
    }

    /// Run as many fixed ticks as `dt` covers (at most `MAX_SUBSTEPS`).
    /// One-shot intents apply to the first tick only; movement persists.
    pub fn advance(&mut self, dt: f32, input: &TickInput) -> Vec<GameEvent> {
        let dt = if dt.is_finite() { dt.clamp(0.0, 0.1) } else { 0.0 };
        self.accumulator += dt;

        let mut input = input.clone();
        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(tick(self, &input, SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;
            input.clear_one_shots();
        }
        events
    }

    /// Clamp anything that escaped the world. Never fires in a correct
    /// simulation; logs when it does.
    pub fn sanitize(&mut self) {
        if !self.wind.is_finite() {
            log::warn!("non-finite wind reset");
            self.wind = 0.0;
        }
        let half = UNIT_WIDTH / 2.0;
        for unit in self.teams.iter_mut().flat_map(|t| t.units.iter_mut()) {
            if !unit.vel.is_finite() {
                log::warn!("{:?} unit {} had non-finite velocity", unit.team, unit.index);
                unit.vel = Vec2::ZERO;
            }
            if !unit.pos.is_finite() {
                log::warn!("{:?} unit {} had non-finite position", unit.team, unit.index);
                let x = if unit.pos.x.is_finite() { unit.pos.x } else { WORLD_WIDTH / 2.0 };
                unit.pos = Vec2::new(x, 0.0);
                unit.set_feet(GROUND_Y);
                unit.vel = Vec2::ZERO;
            }
            if unit.pos.x < half || unit.pos.x > WORLD_WIDTH - half {
                log::warn!("{:?} unit {} clamped into the world", unit.team, unit.index);
                unit.pos.x = unit.pos.x.clamp(half, WORLD_WIDTH - half);
            }
            if unit.feet_y() > GROUND_Y {
                log::warn!("{:?} unit {} was below ground", unit.team, unit.index);
                unit.set_feet(GROUND_Y);
                unit.vel = Vec2::ZERO;
            }
        }
    }
}
