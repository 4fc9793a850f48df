//! Property-based tests for the simulation invariants.
//!
//! Run with: cargo test --release prop_sim

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use territory_wars::consts::*;
use territory_wars::falloff_damage;
use territory_wars::sim::{
    AmmoPool, FireCommand, GameEvent, GameState, MatchPhase, StepBudget, TeamId, TickInput, UnitClass, WeaponKind,
    explosion_damage, fire, tick,
};
use territory_wars::{ActionError, MapVariant, MatchSettings};

fn weapon() -> impl Strategy<Value = WeaponKind> {
    prop_oneof![
        Just(WeaponKind::Grenade),
        Just(WeaponKind::Rifle),
        Just(WeaponKind::Bazooka),
    ]
}

fn map() -> impl Strategy<Value = MapVariant> {
    prop_oneof![
        Just(MapVariant::Plains),
        Just(MapVariant::Fortress),
        Just(MapVariant::Canyon),
    ]
}

#[derive(Debug, Clone)]
enum BudgetOp {
    Walk(f32),
    Attack(u32),
    Reset,
}

fn budget_op() -> impl Strategy<Value = BudgetOp> {
    prop_oneof![
        (0.0f32..300.0).prop_map(BudgetOp::Walk),
        (0u32..5).prop_map(BudgetOp::Attack),
        Just(BudgetOp::Reset),
    ]
}

proptest! {
    /// Damage never grows with distance, peaks at the centre and dies at the rim.
    #[test]
    fn prop_falloff_monotone(
        radius in 1.0f32..200.0,
        peak in 1u32..100,
        a in 0.0f32..1.5,
        b in 0.0f32..1.5,
    ) {
        let peak = peak as f32;
        let (near, far) = if a <= b { (a * radius, b * radius) } else { (b * radius, a * radius) };
        prop_assert!(falloff_damage(near, radius, peak) >= falloff_damage(far, radius, peak));
        prop_assert_eq!(falloff_damage(0.0, radius, peak), peak as u32);
        prop_assert_eq!(falloff_damage(radius, radius, peak), 0);
    }

    /// Cover halves once and never more.
    #[test]
    fn prop_cover_halves_once(dist in 0.0f32..100.0, radius in 1.0f32..100.0, peak in 0u32..100) {
        let peak = peak as f32;
        let open = explosion_damage(dist, radius, peak, false);
        let covered = explosion_damage(dist, radius, peak, true);
        prop_assert_eq!(covered, open / 2);
        prop_assert!(covered <= open);
    }

    /// used + remaining == max through any mix of walking and attacking.
    #[test]
    fn prop_step_budget_invariant(max in 1u32..12, ops in prop::collection::vec(budget_op(), 0..40)) {
        let mut budget = StepBudget::new(max);
        for op in ops {
            match op {
                BudgetOp::Walk(distance) => {
                    let allowance = budget.walk_allowance();
                    let granted = budget.walk(distance);
                    prop_assert!(granted <= distance.max(0.0) + 1e-3);
                    prop_assert!(granted <= allowance + 1e-3);
                }
                BudgetOp::Attack(steps) => {
                    let before = budget.remaining();
                    match budget.try_spend(steps) {
                        Ok(()) => prop_assert_eq!(budget.remaining(), before - steps),
                        Err(_) => prop_assert_eq!(budget.remaining(), before),
                    }
                }
                BudgetOp::Reset => budget.reset(),
            }
            prop_assert!(budget.remaining() <= budget.max());
            prop_assert_eq!(budget.used() + budget.remaining(), budget.max());
        }
    }

    /// Firing never drives ammo below zero; an empty slot changes nothing.
    #[test]
    fn prop_fire_respects_ammo(
        grenade in 0u32..3,
        rifle in 0u32..3,
        bazooka in 0u32..3,
        shots in prop::collection::vec(weapon(), 1..6),
    ) {
        let mut state = GameState::new(MatchSettings::default());
        state.teams[0].ammo = AmmoPool { grenade, rifle, bazooka };

        for weapon in shots {
            let ammo = state.teams[0].ammo;
            let steps = state.turn.budget(TeamId::A).remaining();
            let in_flight = state.projectiles.len();
            let mut events = Vec::new();
            let command = FireCommand { weapon, angle: 0.8, power: 40.0 };

            match fire(&mut state, TeamId::A, 0, command, &mut events) {
                Ok(()) => {
                    prop_assert_eq!(ammo.count(weapon).unwrap() - 1, state.teams[0].ammo.count(weapon).unwrap());
                    prop_assert_eq!(state.projectiles.len(), in_flight + 1);
                }
                Err(err) => {
                    prop_assert!(matches!(err, ActionError::OutOfAmmo(_) | ActionError::InsufficientSteps { .. }), "unexpected error: {:?}", err);
                    prop_assert_eq!(state.teams[0].ammo, ammo);
                    prop_assert_eq!(state.turn.budget(TeamId::A).remaining(), steps);
                    prop_assert_eq!(state.projectiles.len(), in_flight);
                    prop_assert!(events.is_empty());
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Running out the clock flips the active team once and resets the newcomer.
    #[test]
    fn prop_countdown_expiry_flips_once(turn_time in 1.0f32..20.0, map in map()) {
        let settings = MatchSettings { turn_time_secs: turn_time, map, ..Default::default() };
        let mut state = GameState::new(settings);

        let max_ticks = (turn_time / SIM_DT).ceil() as usize + 2;
        let mut flips = 0;
        for _ in 0..max_ticks {
            let events = tick(&mut state, &TickInput::default(), SIM_DT);
            let changed = events.iter().filter(|e| matches!(e, GameEvent::TurnChanged { .. })).count();
            if changed > 0 {
                flips += changed;
                prop_assert_eq!(state.turn.active, TeamId::B);
                prop_assert_eq!(state.turn.budget(TeamId::B).remaining(), map.max_steps());
                prop_assert_eq!(state.turn.countdown_secs(), turn_time);
                break;
            }
        }
        prop_assert_eq!(flips, 1);
    }

    /// A CPU side that only holds still gets its turn before handing it back.
    #[test]
    fn prop_countdown_expiry_to_idle_cpu_flips_once(
        turn_time in 1.0f32..6.0,
        map in prop_oneof![Just(MapVariant::Plains), Just(MapVariant::Fortress)],
    ) {
        let settings = MatchSettings { turn_time_secs: turn_time, map, ..Default::default() };
        let mut state = GameState::new(settings);
        // Leave team B with a healthy medic and nobody to treat
        for unit in state.teams[1].units.iter_mut().filter(|u| u.class != UnitClass::Medic) {
            unit.hp = 0;
        }

        let max_ticks = (turn_time / SIM_DT).ceil() as usize + 2;
        let mut expired = None;
        for _ in 0..max_ticks {
            let events = tick(&mut state, &TickInput::default(), SIM_DT);
            let flips: Vec<_> = events.iter().filter(|e| matches!(e, GameEvent::TurnChanged { .. })).collect();
            if !flips.is_empty() {
                expired = Some(flips.len());
                break;
            }
        }
        prop_assert_eq!(expired, Some(1));
        prop_assert_eq!(state.turn.active, TeamId::B);

        let events = tick(&mut state, &TickInput::default(), SIM_DT);
        prop_assert!(events.contains(&GameEvent::TurnChanged { active: TeamId::A }), "missing TurnChanged to team A");
    }

    /// Whatever happened before, restart yields the documented initial state.
    #[test]
    fn prop_restart_resets(seed in any::<u64>(), map in map(), ticks in 0usize..900) {
        let settings = MatchSettings { seed, map, autopilot: true, ..Default::default() };
        let mut state = GameState::new(settings);
        for _ in 0..ticks {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let round = state.match_state.round;

        state.restart();
        prop_assert_eq!(state.match_state.phase, MatchPhase::Playing);
        prop_assert_eq!(state.match_state.round, round + 1);
        prop_assert_eq!(state.match_state.winner, None);
        prop_assert_eq!(state.scores(), [0, 0]);
        prop_assert_eq!(state.turn.active, TeamId::A);
        prop_assert_eq!(state.turn.turn_number, 1);
        prop_assert_eq!(state.turn.countdown_secs(), state.settings.turn_time_secs);
        prop_assert!(state.projectiles.is_empty());
        prop_assert!(state.powerups.is_empty());
        for team in &state.teams {
            prop_assert_eq!(team.ammo, AmmoPool::default());
            prop_assert_eq!(team.units.len(), map.roster().len());
            prop_assert_eq!(state.turn.budget(team.id).remaining(), map.max_steps());
            for unit in &team.units {
                prop_assert!(unit.alive);
                prop_assert_eq!(unit.hp, unit.max_hp());
            }
        }
    }
}
