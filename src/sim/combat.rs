//! Combat resolution - area damage, direct hits, knockback, eliminations

use glam::Vec2;

use super::los::is_in_cover;
use super::terrain::Terrain;
use super::units::{Team, TeamId, Unit};
use crate::consts::{KILL_SCORE, KNOCKBACK_STRENGTH, MELEE_RANGE};
use crate::falloff_damage;

/// One unit caught in a blast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionHit {
    pub team: TeamId,
    pub index: usize,
    pub damage: u32,
    pub covered: bool,
}

/// A unit hidden by the elimination pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub team: TeamId,
    pub index: usize,
}

/// Terminal outcome of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Winner(TeamId),
    /// Both sides wiped out on the same tick
    Draw,
}

/// Falloff damage, halved exactly once when the target is in cover
pub fn explosion_damage(dist: f32, radius: f32, peak: f32, covered: bool) -> u32 {
    let base = falloff_damage(dist, radius, peak);
    if covered { base / 2 } else { base }
}

/// Damage every living unit within `radius` of `center` and knock it away.
/// Cover is judged from the blast centre to each unit.
pub fn apply_explosion(
    teams: &mut [Team; 2],
    terrain: &Terrain,
    center: Vec2,
    radius: f32,
    peak: f32,
) -> Vec<ExplosionHit> {
    let mut hits = Vec::new();
    for unit in teams.iter_mut().flat_map(|t| t.units.iter_mut()) {
        if !unit.is_active() {
            continue;
        }
        let dist = unit.pos.distance(center);
        if dist >= radius {
            continue;
        }

        let covered = is_in_cover(terrain, unit.pos, center);
        let damage = unit.take_damage(explosion_damage(dist, radius, peak, covered));
        apply_knockback(unit, center, 1.0 - dist / radius);

        hits.push(ExplosionHit {
            team: unit.team,
            index: unit.index,
            damage,
            covered,
        });
    }
    hits
}

/// Impulse along centre -> unit, strongest at point-blank, with some lift so
/// grounded units actually leave the floor
pub fn apply_knockback(unit: &mut Unit, center: Vec2, scale: f32) {
    let dir = (unit.pos - center).normalize_or(Vec2::NEG_Y);
    let strength = KNOCKBACK_STRENGTH * scale.clamp(0.0, 1.0);
    unit.vel += dir * strength + Vec2::NEG_Y * strength * 0.5;
}

/// Flat damage, no falloff, floored at zero. Returns damage dealt.
pub fn apply_direct_hit(unit: &mut Unit, damage: u32) -> u32 {
    unit.take_damage(damage)
}

/// Nearest living enemy within kicking range of `from`
pub fn melee_target(teams: &[Team; 2], attacker: TeamId, from: Vec2) -> Option<usize> {
    teams[attacker.opponent().index()]
        .living()
        .map(|u| (u.index, u.pos.distance(from)))
        .filter(|&(_, dist)| dist <= MELEE_RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Hide every unit that reached 0 HP and credit the kill to the other side
pub fn process_eliminations(teams: &mut [Team; 2]) -> Vec<Elimination> {
    let mut eliminated = Vec::new();
    for team in teams.iter_mut() {
        for unit in team.units.iter_mut().filter(|u| u.alive && u.hp == 0) {
            unit.alive = false;
            unit.vel = Vec2::ZERO;
            eliminated.push(Elimination {
                team: team.id,
                index: unit.index,
            });
        }
        if team.selected_unit().is_err() {
            team.selected = team.first_living();
        }
    }

    for elimination in &eliminated {
        let scorer = &mut teams[elimination.team.opponent().index()];
        scorer.score += KILL_SCORE;
        log::info!(
            "{:?} unit {} eliminated, team {:?} score {}",
            elimination.team,
            elimination.index,
            scorer.id,
            scorer.score
        );
    }
    eliminated
}

/// A team loses when every member is at 0 HP
pub fn check_win_conditions(teams: &[Team; 2]) -> Option<MatchOutcome> {
    match (teams[0].is_defeated(), teams[1].is_defeated()) {
        (false, false) => None,
        (true, false) => Some(MatchOutcome::Winner(TeamId::B)),
        (false, true) => Some(MatchOutcome::Winner(TeamId::A)),
        (true, true) => Some(MatchOutcome::Draw),
    }
}
