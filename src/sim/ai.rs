//! CPU decision making
//!
//! One strategy per unit class, looked up by class and asked for a single
//! action per CPU unit per tick. Policies are pure functions of the view:
//! no randomness, so a seeded match replays identically.

use glam::Vec2;

use super::los::is_in_cover;
use super::terrain::Terrain;
use super::units::{AmmoPool, Unit, UnitClass, WeaponKind};
use crate::aim_angle;
use crate::consts::*;

/// Sniper engagement band
pub const SNIPER_MIN_RANGE: f32 = 200.0;
pub const SNIPER_MAX_RANGE: f32 = 400.0;
/// Heavy closes to this range before looking for cover
pub const HEAVY_ENGAGE_RANGE: f32 = 150.0;
/// Soldier closes to this range before attacking
pub const SOLDIER_ENGAGE_RANGE: f32 = 250.0;
/// Beyond this range the bazooka is preferred
pub const LONG_RANGE: f32 = 250.0;
/// Aim error (radians) for a unit of accuracy 1.0
pub const BASE_AIM_ERROR: f32 = 0.04;
/// Heavy only walks to cover this close by
const COVER_SEARCH_RADIUS: f32 = 200.0;
/// Close enough to a waypoint to stop walking
const ARRIVE_TOLERANCE: f32 = 4.0;

/// What a CPU unit wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuAction {
    Hold,
    /// Walk (or climb, if pointing up) along the intent
    Move(Vec2),
    Attack { weapon: WeaponKind, angle: f32, power: f32 },
    /// Heal the ally with this index
    Heal { ally: usize },
}

/// Everything a policy may look at
#[derive(Debug, Clone, Copy)]
pub struct BattleView<'a> {
    pub me: &'a Unit,
    /// Own team, including `me`
    pub allies: &'a [Unit],
    pub enemies: &'a [Unit],
    pub terrain: &'a Terrain,
    pub ammo: &'a AmmoPool,
    /// Enough steps left for an attack
    pub can_attack: bool,
}

impl BattleView<'_> {
    /// Closest living enemy; ties go to the lower index
    pub fn nearest_enemy(&self) -> Option<(&Unit, f32)> {
        self.enemies
            .iter()
            .filter(|u| u.is_active())
            .map(|u| (u, u.pos.distance(self.me.pos)))
            .fold(None, |best: Option<(&Unit, f32)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })
    }

    fn toward_x(&self, x: f32) -> CpuAction {
        let dx = x - self.me.pos.x;
        if dx.abs() <= ARRIVE_TOLERANCE {
            CpuAction::Hold
        } else {
            CpuAction::Move(Vec2::new(dx.signum(), 0.0))
        }
    }

    fn advance_on(&self, target: &Unit) -> CpuAction {
        self.toward_x(target.pos.x)
    }

    /// Attack `target` with the preferred weapon, or close in when nothing
    /// is usable at this range
    fn attack(&self, target: &Unit, dist: f32) -> CpuAction {
        if !self.can_attack {
            return CpuAction::Hold;
        }
        match choose_weapon(self.ammo, dist) {
            Some(weapon) => {
                let (angle, power) = aim(weapon, self.me, target.pos);
                CpuAction::Attack { weapon, angle, power }
            }
            None => self.advance_on(target),
        }
    }
}

/// Per-class policy
pub trait CpuStrategy {
    fn decide(&self, view: &BattleView<'_>) -> CpuAction;
}

/// Keeps a long-range band and prefers high ground
pub struct SniperPolicy;
/// Closes in, then fights from cover
pub struct HeavyPolicy;
/// Tends the most wounded ally
pub struct MedicPolicy;
/// Advances to medium range and fights
pub struct SoldierPolicy;

pub fn strategy_for(class: UnitClass) -> &'static dyn CpuStrategy {
    match class {
        UnitClass::Soldier => &SoldierPolicy,
        UnitClass::Sniper => &SniperPolicy,
        UnitClass::Heavy => &HeavyPolicy,
        UnitClass::Medic => &MedicPolicy,
    }
}

impl CpuStrategy for SniperPolicy {
    fn decide(&self, view: &BattleView<'_>) -> CpuAction {
        let Some((enemy, dist)) = view.nearest_enemy() else {
            return CpuAction::Hold;
        };
        let me = view.me;

        if dist < SNIPER_MIN_RANGE {
            let away = -(enemy.pos.x - me.pos.x).signum();
            let half = UNIT_WIDTH / 2.0;
            let cornered = (away < 0.0 && me.pos.x <= half + 1.0)
                || (away > 0.0 && me.pos.x >= WORLD_WIDTH - half - 1.0);
            if !cornered {
                return CpuAction::Move(Vec2::new(away, 0.0));
            }
            // Pinned at the edge: only high ground is left
            return match view.terrain.climb_target(me.pos.x, me.feet_y()) {
                Some((_, from_x)) if (from_x - me.pos.x).abs() <= ARRIVE_TOLERANCE => CpuAction::Move(Vec2::NEG_Y),
                _ => CpuAction::Hold,
            };
        }
        if dist <= SNIPER_MAX_RANGE {
            return view.attack(enemy, dist);
        }

        match view.terrain.climb_target(me.pos.x, me.feet_y()) {
            Some((_, from_x)) if (from_x - me.pos.x).abs() <= ARRIVE_TOLERANCE => CpuAction::Move(Vec2::NEG_Y),
            Some((_, from_x)) => view.toward_x(from_x),
            None => view.advance_on(enemy),
        }
    }
}

impl CpuStrategy for HeavyPolicy {
    fn decide(&self, view: &BattleView<'_>) -> CpuAction {
        let Some((enemy, dist)) = view.nearest_enemy() else {
            return CpuAction::Hold;
        };
        if dist >= HEAVY_ENGAGE_RANGE {
            return view.advance_on(enemy);
        }

        let me = view.me;
        if !is_in_cover(view.terrain, me.pos, enemy.pos) {
            if let Some(platform) = view.terrain.nearest_platform(me.pos.x) {
                let dx = (platform.center().x - me.pos.x).abs();
                if dx > ARRIVE_TOLERANCE && dx < COVER_SEARCH_RADIUS {
                    return view.toward_x(platform.center().x);
                }
            }
        }
        view.attack(enemy, dist)
    }
}

impl CpuStrategy for MedicPolicy {
    fn decide(&self, view: &BattleView<'_>) -> CpuAction {
        let me = view.me;
        let patient = view
            .allies
            .iter()
            .filter(|u| u.is_active() && u.index != me.index && u.hp_fraction() < HEAL_THRESHOLD)
            .min_by(|a, b| a.hp_fraction().total_cmp(&b.hp_fraction()));
        let Some(patient) = patient else {
            return CpuAction::Hold;
        };

        if patient.pos.distance(me.pos) <= HEAL_RANGE {
            return if view.can_attack {
                CpuAction::Heal { ally: patient.index }
            } else {
                CpuAction::Hold
            };
        }

        let dx = patient.pos.x - me.pos.x;
        if dx.abs() <= ARRIVE_TOLERANCE && patient.feet_y() < me.feet_y() - 1.0 {
            CpuAction::Move(Vec2::NEG_Y)
        } else {
            view.toward_x(patient.pos.x)
        }
    }
}

impl CpuStrategy for SoldierPolicy {
    fn decide(&self, view: &BattleView<'_>) -> CpuAction {
        let Some((enemy, dist)) = view.nearest_enemy() else {
            return CpuAction::Hold;
        };
        if dist >= SOLDIER_ENGAGE_RANGE {
            view.advance_on(enemy)
        } else {
            view.attack(enemy, dist)
        }
    }
}

/// Bazooka at long range, grenade at short range, boot at point-blank,
/// rifle as the fallback. `None` when nothing usable is left.
pub fn choose_weapon(ammo: &AmmoPool, dist: f32) -> Option<WeaponKind> {
    if dist > LONG_RANGE && ammo.has(WeaponKind::Bazooka) {
        Some(WeaponKind::Bazooka)
    } else if dist <= LONG_RANGE && ammo.has(WeaponKind::Grenade) {
        Some(WeaponKind::Grenade)
    } else if dist <= MELEE_RANGE {
        Some(WeaponKind::Boot)
    } else if ammo.has(WeaponKind::Rifle) {
        Some(WeaponKind::Rifle)
    } else {
        None
    }
}

/// Angle and power for `weapon` from `shooter` at `target`.
///
/// The rifle aims straight; lobbed weapons fire at 45 degrees with the
/// launch speed that lands on the target under their gravity. The error
/// shrinks with class accuracy and alternates sides by unit index.
pub fn aim(weapon: WeaponKind, shooter: &Unit, target: Vec2) -> (f32, f32) {
    let delta = target - shooter.pos;
    let error = BASE_AIM_ERROR / shooter.class.stats().accuracy;
    let bias = if shooter.index % 2 == 0 { error } else { -error };

    let (angle, power) = match weapon {
        WeaponKind::Rifle | WeaponKind::Boot => (aim_angle(delta), 100.0),
        WeaponKind::Grenade | WeaponKind::Bazooka => {
            let (gravity, scale) = if weapon == WeaponKind::Grenade {
                (GRAVITY, GRENADE_POWER_SCALE)
            } else {
                (GRAVITY * ROCKET_GRAVITY_SCALE, ROCKET_POWER_SCALE)
            };
            let dx = delta.x.abs().max(1.0);
            let drop = dx + delta.y;
            let speed = if drop > 0.0 {
                (gravity * dx * dx / drop).sqrt()
            } else {
                f32::INFINITY
            };
            let angle = if delta.x >= 0.0 {
                std::f32::consts::FRAC_PI_4
            } else {
                3.0 * std::f32::consts::FRAC_PI_4
            };
            (angle, (speed / scale).clamp(10.0, 100.0))
        }
    };
    (angle + bias, power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::terrain::Platform;
    use crate::sim::units::TeamId;

    fn unit(team: TeamId, index: usize, class: UnitClass, x: f32) -> Unit {
        let mut u = Unit::new(index as u32, team, index, class, Vec2::new(x, 0.0));
        u.set_feet(GROUND_Y);
        u
    }

    fn view<'a>(
        me: &'a Unit,
        allies: &'a [Unit],
        enemies: &'a [Unit],
        terrain: &'a Terrain,
        ammo: &'a AmmoPool,
    ) -> BattleView<'a> {
        BattleView {
            me,
            allies,
            enemies,
            terrain,
            ammo,
            can_attack: true,
        }
    }

    #[test]
    fn test_weapon_choice_by_range() {
        let full = AmmoPool::default();
        assert_eq!(choose_weapon(&full, 500.0), Some(WeaponKind::Bazooka));
        assert_eq!(choose_weapon(&full, 120.0), Some(WeaponKind::Grenade));
        // Grenades still come before the boot at point-blank
        assert_eq!(choose_weapon(&full, 40.0), Some(WeaponKind::Grenade));

        let no_grenades = AmmoPool { grenade: 0, rifle: 3, bazooka: 2 };
        assert_eq!(choose_weapon(&no_grenades, 40.0), Some(WeaponKind::Boot));
        assert_eq!(choose_weapon(&no_grenades, 120.0), Some(WeaponKind::Rifle));

        let rifle_only = AmmoPool { grenade: 0, rifle: 3, bazooka: 0 };
        assert_eq!(choose_weapon(&rifle_only, 500.0), Some(WeaponKind::Rifle));
        assert_eq!(choose_weapon(&rifle_only, 120.0), Some(WeaponKind::Rifle));

        let empty = AmmoPool { grenade: 0, rifle: 0, bazooka: 0 };
        assert_eq!(choose_weapon(&empty, 120.0), None);
        assert_eq!(choose_weapon(&empty, 30.0), Some(WeaponKind::Boot));
    }

    #[test]
    fn test_soldier_advances_then_attacks() {
        let terrain = Terrain::flat();
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 0, UnitClass::Soldier, 800.0);
        let far = [unit(TeamId::A, 0, UnitClass::Soldier, 300.0)];
        let allies = [me.clone()];
        let action = SoldierPolicy.decide(&view(&me, &allies, &far, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(-1.0, 0.0)));

        let near = [unit(TeamId::A, 0, UnitClass::Soldier, 650.0)];
        let action = SoldierPolicy.decide(&view(&me, &allies, &near, &terrain, &ammo));
        assert!(matches!(action, CpuAction::Attack { weapon: WeaponKind::Grenade, .. }));
    }

    #[test]
    fn test_sniper_keeps_its_band() {
        let terrain = Terrain::flat();
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 0, UnitClass::Sniper, 600.0);
        let allies = [me.clone()];

        let close = [unit(TeamId::A, 0, UnitClass::Soldier, 500.0)];
        let action = SniperPolicy.decide(&view(&me, &allies, &close, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(1.0, 0.0)));

        let in_band = [unit(TeamId::A, 0, UnitClass::Soldier, 300.0)];
        let action = SniperPolicy.decide(&view(&me, &allies, &in_band, &terrain, &ammo));
        assert!(matches!(action, CpuAction::Attack { weapon: WeaponKind::Bazooka, .. }));

        // Out of band on open ground: advance
        let far = [unit(TeamId::A, 0, UnitClass::Soldier, 100.0)];
        let action = SniperPolicy.decide(&view(&me, &allies, &far, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn test_cornered_sniper_never_fires_inside_its_band() {
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 0, UnitClass::Sniper, WORLD_WIDTH - 15.0);
        let allies = [me.clone()];
        let enemies = [unit(TeamId::A, 0, UnitClass::Soldier, 1100.0)];

        let open = Terrain::flat();
        let action = SniperPolicy.decide(&view(&me, &allies, &enemies, &open, &ammo));
        assert_eq!(action, CpuAction::Hold);

        // A ledge overhead is still worth taking
        let ledge = Terrain::with_platforms(vec![Platform::new(1, WORLD_WIDTH - 30.0, 520.0, 30.0, 16.0)]);
        let action = SniperPolicy.decide(&view(&me, &allies, &enemies, &ledge, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::NEG_Y));
    }

    #[test]
    fn test_sniper_climbs_when_out_of_range() {
        let terrain = Terrain::with_platforms(vec![Platform::new(1, 560.0, 520.0, 80.0, 16.0)]);
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 0, UnitClass::Sniper, 600.0);
        let allies = [me.clone()];
        let far = [unit(TeamId::A, 0, UnitClass::Soldier, 100.0)];
        let action = SniperPolicy.decide(&view(&me, &allies, &far, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::NEG_Y));
    }

    #[test]
    fn test_medic_heals_or_holds() {
        let terrain = Terrain::flat();
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 1, UnitClass::Medic, 600.0);
        let mut hurt = unit(TeamId::B, 0, UnitClass::Soldier, 650.0);
        hurt.hp = 40;
        let enemies = [unit(TeamId::A, 0, UnitClass::Soldier, 100.0)];

        let allies = [hurt.clone(), me.clone()];
        let action = MedicPolicy.decide(&view(&me, &allies, &enemies, &terrain, &ammo));
        assert_eq!(action, CpuAction::Heal { ally: 0 });

        hurt.pos.x = 900.0;
        let allies = [hurt.clone(), me.clone()];
        let action = MedicPolicy.decide(&view(&me, &allies, &enemies, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(1.0, 0.0)));

        hurt.hp = 95;
        let allies = [hurt, me.clone()];
        let action = MedicPolicy.decide(&view(&me, &allies, &enemies, &terrain, &ammo));
        assert_eq!(action, CpuAction::Hold);
    }

    #[test]
    fn test_heavy_takes_cover_before_fighting() {
        // Crate to the right, enemy closing from the left
        let terrain = Terrain::with_platforms(vec![Platform::new(1, 700.0, 560.0, 60.0, 60.0)]);
        let ammo = AmmoPool::default();
        let me = unit(TeamId::B, 0, UnitClass::Heavy, 650.0);
        let allies = [me.clone()];
        let enemies = [unit(TeamId::A, 0, UnitClass::Soldier, 520.0)];
        let action = HeavyPolicy.decide(&view(&me, &allies, &enemies, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(1.0, 0.0)));

        // Behind the crate: fight
        let behind = unit(TeamId::B, 0, UnitClass::Heavy, 780.0);
        let enemies = [unit(TeamId::A, 0, UnitClass::Soldier, 660.0)];
        let action = HeavyPolicy.decide(&view(&behind, &allies, &enemies, &terrain, &ammo));
        assert!(matches!(action, CpuAction::Attack { .. }));

        let far = [unit(TeamId::A, 0, UnitClass::Soldier, 200.0)];
        let action = HeavyPolicy.decide(&view(&me, &allies, &far, &terrain, &ammo));
        assert_eq!(action, CpuAction::Move(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn test_aim_is_deterministic_and_accuracy_scaled() {
        let sniper = unit(TeamId::A, 0, UnitClass::Sniper, 100.0);
        let heavy = unit(TeamId::A, 0, UnitClass::Heavy, 100.0);
        let target = Vec2::new(400.0, sniper.pos.y);
        let (a1, _) = aim(WeaponKind::Rifle, &sniper, target);
        let (a2, _) = aim(WeaponKind::Rifle, &sniper, target);
        assert_eq!(a1, a2);
        let (h, _) = aim(WeaponKind::Rifle, &heavy, target);
        assert!(h.abs() > a1.abs());

        let (angle, power) = aim(WeaponKind::Grenade, &sniper, Vec2::new(-200.0, sniper.pos.y));
        assert!(angle > std::f32::consts::FRAC_PI_2);
        assert!((10.0..=100.0).contains(&power));
    }
}
