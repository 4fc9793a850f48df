//! Fixed timestep simulation tick
//!
//! Core game loop that advances the match deterministically. Order within a
//! tick: restart, turn countdown, intents (human or CPU), unit physics,
//! projectiles, power-ups, eliminations and the win check, then the
//! automatic end of an exhausted turn.

use glam::Vec2;

use super::ai::{BattleView, CpuAction, strategy_for};
use super::ballistics::{Projectile, ProjectileOutcome};
use super::combat::{
    MatchOutcome, apply_direct_hit, apply_explosion, apply_knockback, check_win_conditions, melee_target,
    process_eliminations,
};
use super::powerups::collect;
use super::state::{GameEvent, GameState, MatchPhase};
use super::units::{Facing, TeamId, WeaponKind};
use crate::ActionError;
use crate::aim_direction;
use crate::consts::*;

/// Knockback scale for a boot hit, relative to a point-blank blast
const BOOT_KNOCKBACK: f32 = 0.5;

/// A fire intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireCommand {
    pub weapon: WeaponKind,
    /// Radians, counter-clockwise from +x with screen-up positive
    pub angle: f32,
    /// Charge, 0-100 (ignored by the rifle and the boot)
    pub power: f32,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Switch the acting unit
    pub select_unit: Option<usize>,
    /// Walk direction and pace; pointing up climbs
    pub move_intent: Option<Vec2>,
    pub fire: Option<FireCommand>,
    pub end_turn: bool,
    pub restart: bool,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        self.select_unit.is_none() && self.move_intent.is_none() && self.fire.is_none() && !self.end_turn
    }

    /// Clear one-shot inputs after processing
    pub fn clear_one_shots(&mut self) {
        self.select_unit = None;
        self.fire = None;
        self.end_turn = false;
        self.restart = false;
    }
}

/// Advance the match by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.restart {
        state.restart();
        return events;
    }
    if state.match_state.phase == MatchPhase::GameOver || !dt.is_finite() || dt <= 0.0 {
        return events;
    }
    state.time_ticks += 1;

    let handed_over = state.turn.tick(dt);
    if handed_over {
        log::info!("{:?} ran out of time", state.turn.active);
        switch_turn(state, &mut events);
    }

    let active = state.turn.active;
    if state.is_cpu_controlled(active) {
        if !input.is_empty() {
            log::debug!("intent rejected: {}", ActionError::NotYourTurn);
        }
        // A turn that just started gets one full decision tick before it can yield
        run_cpu(state, dt, !handed_over, &mut events);
    } else {
        apply_player_input(state, input, dt, &mut events);
    }

    for unit in state.teams.iter_mut().flat_map(|t| t.units.iter_mut()) {
        unit.update_physics(&state.terrain, dt);
    }

    update_projectiles(state, dt, &mut events);
    update_powerups(state, dt, &mut events);
    resolve_match(state, &mut events);

    if state.match_state.phase == MatchPhase::Playing && state.turn.active_budget().is_exhausted() {
        log::debug!("{:?} spent every step", state.turn.active);
        switch_turn(state, &mut events);
    }

    state.terrain.sweep_destroyed();
    state.sanitize();
    events
}

fn apply_player_input(state: &mut GameState, input: &TickInput, dt: f32, events: &mut Vec<GameEvent>) {
    let team = state.turn.active;

    if let Some(index) = input.select_unit {
        log_rejection(state.teams[team.index()].select(index));
    }

    if let Some(intent) = input.move_intent {
        let walked = state.teams[team.index()]
            .selected_unit()
            .and_then(|index| move_unit(state, team, index, intent, dt));
        log_rejection(walked.map(|_| ()));
    }

    if let Some(command) = input.fire {
        let fired = state.teams[team.index()]
            .selected_unit()
            .and_then(|index| fire(state, team, index, command, events));
        log_rejection(fired);
    }

    if input.end_turn && state.match_state.phase == MatchPhase::Playing {
        log::info!("{:?} ends the turn", team);
        switch_turn(state, events);
    }
}

fn log_rejection(result: Result<(), ActionError>) {
    if let Err(err) = result {
        log::debug!("intent rejected: {err}");
    }
}

/// Common gate for every intent
fn check_actor(state: &GameState, team: TeamId, index: usize) -> Result<(), ActionError> {
    if state.match_state.phase == MatchPhase::GameOver {
        return Err(ActionError::MatchOver);
    }
    if state.turn.active != team {
        return Err(ActionError::NotYourTurn);
    }
    match state.teams[team.index()].units.get(index) {
        Some(unit) if unit.is_active() => Ok(()),
        Some(_) => Err(ActionError::UnitEliminated(index)),
        None => Err(ActionError::InvalidUnit(index)),
    }
}

/// Walk or climb one tick's worth. Returns the distance covered.
pub fn move_unit(state: &mut GameState, team: TeamId, index: usize, intent: Vec2, dt: f32) -> Result<f32, ActionError> {
    check_actor(state, team, index)?;
    let budget = state.turn.budget_mut(team);
    if budget.is_exhausted() {
        return Err(ActionError::InsufficientSteps {
            needed: 1,
            remaining: 0,
        });
    }
    let unit = &mut state.teams[team.index()].units[index];
    Ok(unit.walk(intent, dt, &state.terrain, budget))
}

/// Fire `command` from unit `index` of `team`.
///
/// Every check runs before anything is spent, so a rejected shot (no ammo,
/// too few steps, nobody in kicking range) leaves the state untouched.
pub fn fire(
    state: &mut GameState,
    team: TeamId,
    index: usize,
    command: FireCommand,
    events: &mut Vec<GameEvent>,
) -> Result<(), ActionError> {
    check_actor(state, team, index)?;
    let side = &state.teams[team.index()];
    if !side.ammo.has(command.weapon) {
        return Err(ActionError::OutOfAmmo(command.weapon));
    }
    let remaining = state.turn.budget(team).remaining();
    if remaining < ATTACK_STEP_COST {
        return Err(ActionError::InsufficientSteps {
            needed: ATTACK_STEP_COST,
            remaining,
        });
    }
    let shooter = &side.units[index];
    let (from, class) = (shooter.pos, shooter.class);
    let melee = match command.weapon {
        WeaponKind::Boot => Some(melee_target(&state.teams, team, from).ok_or(ActionError::NoTarget)?),
        _ => None,
    };

    state.turn.budget_mut(team).try_spend(ATTACK_STEP_COST)?;
    state.teams[team.index()].ammo.consume(command.weapon)?;
    let shooter = &mut state.teams[team.index()].units[index];
    let aim_x = aim_direction(command.angle).x;
    if aim_x.abs() > f32::EPSILON {
        shooter.facing = if aim_x < 0.0 { Facing::Left } else { Facing::Right };
    }

    if let Some(target) = melee {
        let enemy = team.opponent();
        let victim = &mut state.teams[enemy.index()].units[target];
        let damage = apply_direct_hit(victim, class.scale_damage(MELEE_DAMAGE));
        apply_knockback(victim, from, BOOT_KNOCKBACK);
        log::debug!("{:?} unit {} kicks {:?} unit {} for {}", team, index, enemy, target, damage);
        events.push(GameEvent::DirectHit {
            team: enemy,
            index: target,
            damage,
            headshot: false,
        });
        return Ok(());
    }

    let id = state.next_entity_id();
    let wind = state.wind;
    if let Some(projectile) =
        Projectile::launch(id, command.weapon, from, command.angle, command.power, wind, team, index, class)
    {
        log::debug!(
            "{:?} unit {} fires {:?} (angle {:.2}, power {:.0}, wind {:.1})",
            team,
            index,
            projectile.kind,
            command.angle,
            command.power,
            wind
        );
        events.push(GameEvent::ProjectileFired {
            id,
            kind: projectile.kind,
            team,
            index,
        });
        state.projectiles.push(projectile);
    }
    Ok(())
}

/// Medic heal: +30 HP to an ally in range, never above 100. Costs an attack.
pub fn heal(
    state: &mut GameState,
    team: TeamId,
    medic: usize,
    ally: usize,
    events: &mut Vec<GameEvent>,
) -> Result<u32, ActionError> {
    check_actor(state, team, medic)?;
    let side = &state.teams[team.index()];
    let patient = side.units.get(ally).ok_or(ActionError::InvalidUnit(ally))?;
    if !patient.is_active() {
        return Err(ActionError::UnitEliminated(ally));
    }
    if patient.pos.distance(side.units[medic].pos) > HEAL_RANGE {
        return Err(ActionError::NoTarget);
    }

    state.turn.budget_mut(team).try_spend(ATTACK_STEP_COST)?;
    let amount = state.teams[team.index()].units[ally].heal_capped(HEAL_AMOUNT, HEAL_CAP);
    log::debug!("{:?} medic {} heals unit {} for {}", team, medic, ally, amount);
    events.push(GameEvent::UnitHealed {
        team,
        index: ally,
        amount,
    });
    Ok(amount)
}

/// One decision per living CPU unit. Ends the turn when nobody can do
/// anything useful, unless `may_yield` is false.
fn run_cpu(state: &mut GameState, dt: f32, may_yield: bool, events: &mut Vec<GameEvent>) {
    state.cpu_cooldown = (state.cpu_cooldown - dt).max(0.0);
    let team = state.turn.active;
    let mut progressed = false;

    for index in 0..state.teams[team.index()].units.len() {
        if state.turn.active != team || state.turn.budget(team).is_exhausted() {
            return;
        }
        let side = &state.teams[team.index()];
        let me = &side.units[index];
        if !me.is_active() {
            continue;
        }
        if !me.is_grounded(&state.terrain) {
            // Still flying from a knockback; wait for it to land
            progressed = true;
            continue;
        }

        let view = BattleView {
            me,
            allies: &side.units,
            enemies: &state.teams[team.opponent().index()].units,
            terrain: &state.terrain,
            ammo: &side.ammo,
            can_attack: state.turn.budget(team).remaining() >= ATTACK_STEP_COST,
        };
        let action = strategy_for(me.class).decide(&view);

        match action {
            CpuAction::Hold => {}
            CpuAction::Move(intent) => match move_unit(state, team, index, intent, dt) {
                Ok(walked) => progressed |= walked > 0.0,
                Err(err) => log::debug!("CPU move rejected: {err}"),
            },
            CpuAction::Attack { .. } | CpuAction::Heal { .. } if state.cpu_cooldown > 0.0 => {
                // Attacks are paced; waiting with steps in hand still counts
                progressed = true;
            }
            CpuAction::Attack { weapon, angle, power } => {
                match fire(state, team, index, FireCommand { weapon, angle, power }, events) {
                    Ok(()) => {
                        progressed = true;
                        state.cpu_cooldown = CPU_ACTION_DELAY_SECS;
                    }
                    Err(err) => log::debug!("CPU attack rejected: {err}"),
                }
            }
            CpuAction::Heal { ally } => match heal(state, team, index, ally, events) {
                Ok(_) => {
                    progressed = true;
                    state.cpu_cooldown = CPU_ACTION_DELAY_SECS;
                }
                Err(err) => log::debug!("CPU heal rejected: {err}"),
            },
        }
    }

    if !progressed && may_yield && state.match_state.phase == MatchPhase::Playing {
        log::info!("CPU {:?} has nothing left to do", team);
        switch_turn(state, events);
    }
}

/// Hand the turn over. Projectiles in flight keep flying.
pub fn switch_turn(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let next = state.turn.end_turn();
    state.reroll_wind();
    state.cpu_cooldown = if state.is_cpu_controlled(next) {
        CPU_ACTION_DELAY_SECS
    } else {
        0.0
    };
    let side = &mut state.teams[next.index()];
    side.selected = side.first_living();

    log::info!(
        "Turn {}: {:?} to act, wind {:.1}",
        state.turn.turn_number,
        next,
        state.wind
    );
    events.push(GameEvent::TurnChanged { active: next });
}

fn update_projectiles(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let mut finished = Vec::new();
    let (terrain, teams) = (&state.terrain, &state.teams);
    state.projectiles.retain_mut(|p| match p.advance(dt, terrain, teams) {
        ProjectileOutcome::Flying => true,
        outcome => {
            finished.push((p.id, outcome));
            false
        }
    });

    for (id, outcome) in finished {
        match outcome {
            ProjectileOutcome::Detonate { pos, radius, peak } => {
                events.push(GameEvent::Explosion { pos, radius });
                // Units first: cover is judged against the terrain as it was
                let hits = apply_explosion(&mut state.teams, &state.terrain, pos, radius, peak);
                for hit in &hits {
                    log::debug!(
                        "projectile {} blast hits {:?} unit {} for {}{}",
                        id,
                        hit.team,
                        hit.index,
                        hit.damage,
                        if hit.covered { " (cover)" } else { "" }
                    );
                }
                for platform in state.terrain.apply_area_damage(pos, radius, peak) {
                    events.push(GameEvent::PlatformDestroyed { id: platform });
                }
            }
            ProjectileOutcome::HitUnit {
                team,
                index,
                damage,
                headshot,
                ..
            } => {
                let dealt = apply_direct_hit(&mut state.teams[team.index()].units[index], damage);
                log::debug!(
                    "projectile {} hits {:?} unit {} for {}{}",
                    id,
                    team,
                    index,
                    dealt,
                    if headshot { " (headshot)" } else { "" }
                );
                events.push(GameEvent::DirectHit {
                    team,
                    index,
                    damage: dealt,
                    headshot,
                });
            }
            ProjectileOutcome::Expired => log::debug!("projectile {} expired", id),
            ProjectileOutcome::Flying => {}
        }
    }
}

fn update_powerups(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    if state.spawner.tick(dt) && state.powerups.len() < MAX_POWERUPS {
        let id = state.next_entity_id();
        if let Some(powerup) = state.spawner.spawn(id, &mut state.powerups, &state.terrain, &mut state.rng) {
            log::debug!("{:?} pickup {} at {:.0}", powerup.kind, powerup.id, powerup.pos.x);
            events.push(GameEvent::PowerUpSpawned {
                id: powerup.id,
                kind: powerup.kind,
                pos: powerup.pos,
            });
        }
    }

    for pickup in collect(&mut state.powerups, &mut state.teams) {
        events.push(GameEvent::PowerUpCollected {
            id: pickup.id,
            kind: pickup.kind,
            team: pickup.team,
            index: pickup.index,
        });
        if pickup.healed > 0 {
            events.push(GameEvent::UnitHealed {
                team: pickup.team,
                index: pickup.index,
                amount: pickup.healed,
            });
        }
    }
}

fn resolve_match(state: &mut GameState, events: &mut Vec<GameEvent>) {
    for elimination in process_eliminations(&mut state.teams) {
        events.push(GameEvent::UnitEliminated {
            team: elimination.team,
            index: elimination.index,
        });
    }

    let Some(outcome) = check_win_conditions(&state.teams) else {
        return;
    };
    let winner = match outcome {
        MatchOutcome::Winner(team) => Some(team),
        MatchOutcome::Draw => None,
    };
    state.match_state.phase = MatchPhase::GameOver;
    state.match_state.winner = winner;
    let scores = state.scores();
    match winner {
        Some(team) => log::info!("Match over: {:?} wins ({} - {})", team, scores[0], scores[1]),
        None => log::info!("Match over: draw ({} - {})", scores[0], scores[1]),
    }
    events.push(GameEvent::MatchEnded { winner, scores });
}
