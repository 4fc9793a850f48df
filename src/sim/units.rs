//! Units, teams and the shared ammo pool

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use super::turn::StepBudget;
use crate::ActionError;
use crate::consts::*;

/// Side identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamId {
    A,
    B,
}

impl TeamId {
    pub const BOTH: [TeamId; 2] = [TeamId::A, TeamId::B];

    pub fn index(self) -> usize {
        match self {
            TeamId::A => 0,
            TeamId::B => 1,
        }
    }

    pub fn opponent(self) -> TeamId {
        match self {
            TeamId::A => TeamId::B,
            TeamId::B => TeamId::A,
        }
    }
}

/// Per-class stat line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStats {
    pub max_hp: u32,
    pub accuracy: f32,
    pub speed: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Soldier,
    Sniper,
    Heavy,
    Medic,
}

impl UnitClass {
    pub const fn stats(self) -> ClassStats {
        match self {
            UnitClass::Soldier => ClassStats { max_hp: 100, accuracy: 1.0, speed: 1.0, damage: 1.0 },
            UnitClass::Sniper => ClassStats { max_hp: 80, accuracy: 1.3, speed: 0.8, damage: 1.5 },
            UnitClass::Heavy => ClassStats { max_hp: 150, accuracy: 0.7, speed: 0.6, damage: 1.2 },
            UnitClass::Medic => ClassStats { max_hp: 90, accuracy: 0.9, speed: 1.1, damage: 0.8 },
        }
    }

    /// Direct damage scaled by the class damage multiplier
    pub fn scale_damage(self, base: u32) -> u32 {
        (base as f32 * self.stats().damage).round() as u32
    }
}

/// Weapon selection; `Boot` is the unlimited melee kick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Grenade,
    Rifle,
    Bazooka,
    Boot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// A combat unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: u32,
    pub team: TeamId,
    pub index: usize,
    pub class: UnitClass,
    /// Body centre
    pub pos: Vec2,
    /// Knockback / falling velocity (zero while standing)
    pub vel: Vec2,
    pub hp: u32,
    pub facing: Facing,
    /// Cleared by the elimination pass; the unit is hidden, never removed
    pub alive: bool,
}

impl Unit {
    pub fn new(id: u32, team: TeamId, index: usize, class: UnitClass, pos: Vec2) -> Self {
        Self {
            id,
            team,
            index,
            class,
            pos,
            vel: Vec2::ZERO,
            hp: class.stats().max_hp,
            facing: match team {
                TeamId::A => Facing::Right,
                TeamId::B => Facing::Left,
            },
            alive: true,
        }
    }

    pub fn max_hp(&self) -> u32 {
        self.class.stats().max_hp
    }

    /// Alive and not yet knocked out this tick
    #[inline]
    pub fn is_active(&self) -> bool {
        self.alive && self.hp > 0
    }

    pub fn hp_fraction(&self) -> f32 {
        self.hp as f32 / self.max_hp() as f32
    }

    #[inline]
    pub fn feet_y(&self) -> f32 {
        self.pos.y + UNIT_HEIGHT / 2.0
    }

    #[inline]
    pub fn top_y(&self) -> f32 {
        self.pos.y - UNIT_HEIGHT / 2.0
    }

    pub fn set_feet(&mut self, y: f32) {
        self.pos.y = y - UNIT_HEIGHT / 2.0;
    }

    /// Point inside the body box grown by `pad`
    pub fn contains(&self, point: Vec2, pad: f32) -> bool {
        (point.x - self.pos.x).abs() <= UNIT_WIDTH / 2.0 + pad
            && (point.y - self.pos.y).abs() <= UNIT_HEIGHT / 2.0 + pad
    }

    /// Impacts in the top third of the body are headshots
    pub fn is_headshot(&self, point: Vec2) -> bool {
        point.y < self.top_y() + UNIT_HEIGHT / 3.0
    }

    /// Flat HP subtraction floored at zero. Returns the damage actually dealt.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Restore HP up to `cap` (and the class max); never lowers HP.
    /// Returns the HP gained.
    pub fn heal_capped(&mut self, amount: u32, cap: u32) -> u32 {
        let ceiling = cap.min(self.max_hp());
        let target = self.hp.saturating_add(amount).min(ceiling).max(self.hp);
        let gained = target - self.hp;
        self.hp = target;
        gained
    }

    pub fn is_grounded(&self, terrain: &Terrain) -> bool {
        let support = terrain.surface_below(self.pos.x, self.feet_y() - 1.0);
        self.vel == Vec2::ZERO && (support - self.feet_y()).abs() <= 1.0
    }

    /// Walk (or climb) for one tick, paying from `budget`.
    ///
    /// `intent` points the way to go; its length (capped at 1) scales the pace.
    /// An intent pointing mostly up climbs onto the lowest ledge within reach.
    /// Returns the distance actually covered.
    pub fn walk(
        &mut self,
        intent: Vec2,
        dt: f32,
        terrain: &Terrain,
        budget: &mut StepBudget,
    ) -> f32 {
        let magnitude = intent.length().min(1.0);
        if !intent.is_finite() || magnitude <= f32::EPSILON || !self.is_active() {
            return 0.0;
        }
        if !self.is_grounded(terrain) {
            return 0.0;
        }
        let dir = intent.normalize();

        if dir.y < -0.5 {
            let Some(ledge) = terrain.ledge_above(self.pos.x, self.feet_y(), CLIMB_REACH) else {
                return 0.0;
            };
            let rise = self.feet_y() - ledge;
            if budget.walk_allowance() < rise {
                return 0.0;
            }
            let spent = budget.walk(rise);
            self.set_feet(ledge);
            return spent;
        }

        if dir.x.abs() <= f32::EPSILON {
            return 0.0;
        }
        self.facing = if dir.x < 0.0 { Facing::Left } else { Facing::Right };

        let wanted = dir.x.abs() * magnitude * WALK_SPEED * self.class.stats().speed * dt;
        let half = UNIT_WIDTH / 2.0;
        let target_x = (self.pos.x + dir.x.signum() * wanted).clamp(half, WORLD_WIDTH - half);
        let allowed = budget.walk((target_x - self.pos.x).abs());
        self.pos.x += dir.x.signum() * allowed;
        // Walking off a ledge leaves the unit airborne; physics drops it.
        allowed
    }

    /// Knockback and falling. One-way platforms: only caught while descending.
    pub fn update_physics(&mut self, terrain: &Terrain, dt: f32) {
        if !self.alive {
            return;
        }
        let support = terrain.surface_below(self.pos.x, self.feet_y() - 1.0);
        if self.vel == Vec2::ZERO && (support - self.feet_y()).abs() <= 1.0 {
            self.set_feet(support);
            return;
        }

        let old_feet = self.feet_y();
        self.vel.y += GRAVITY * dt;
        self.pos += self.vel * dt;

        let half = UNIT_WIDTH / 2.0;
        if self.pos.x < half || self.pos.x > WORLD_WIDTH - half {
            self.pos.x = self.pos.x.clamp(half, WORLD_WIDTH - half);
            self.vel.x = 0.0;
        }

        let surface = terrain.surface_below(self.pos.x, old_feet.min(self.feet_y()) - 1.0);
        if self.vel.y >= 0.0 && self.feet_y() >= surface {
            self.set_feet(surface);
            self.vel = Vec2::ZERO;
        }
    }
}

/// Shared per-team ammo; the boot is unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoPool {
    pub grenade: u32,
    pub rifle: u32,
    pub bazooka: u32,
}

impl Default for AmmoPool {
    fn default() -> Self {
        Self {
            grenade: INITIAL_GRENADES,
            rifle: INITIAL_RIFLE,
            bazooka: INITIAL_BAZOOKA,
        }
    }
}

impl AmmoPool {
    /// Remaining rounds, `None` for unlimited
    pub fn count(&self, weapon: WeaponKind) -> Option<u32> {
        match weapon {
            WeaponKind::Grenade => Some(self.grenade),
            WeaponKind::Rifle => Some(self.rifle),
            WeaponKind::Bazooka => Some(self.bazooka),
            WeaponKind::Boot => None,
        }
    }

    pub fn has(&self, weapon: WeaponKind) -> bool {
        self.count(weapon).is_none_or(|n| n > 0)
    }

    pub fn consume(&mut self, weapon: WeaponKind) -> Result<(), ActionError> {
        let slot = match weapon {
            WeaponKind::Grenade => &mut self.grenade,
            WeaponKind::Rifle => &mut self.rifle,
            WeaponKind::Bazooka => &mut self.bazooka,
            WeaponKind::Boot => return Ok(()),
        };
        if *slot == 0 {
            return Err(ActionError::OutOfAmmo(weapon));
        }
        *slot -= 1;
        Ok(())
    }

    /// Ammo pickup: top every slot up toward its cap
    pub fn replenish(&mut self) {
        self.grenade = (self.grenade + 2).min(MAX_GRENADES.max(self.grenade));
        self.rifle = (self.rifle + 5).min(MAX_RIFLE.max(self.rifle));
        self.bazooka = (self.bazooka + 1).min(MAX_BAZOOKA.max(self.bazooka));
    }
}

/// A side: its units, shared ammo and running score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub units: Vec<Unit>,
    pub ammo: AmmoPool,
    pub score: u32,
    /// Unit acting for the human side
    pub selected: Option<usize>,
}

impl Team {
    /// Field `roster` at the given spawn x positions, standing on the terrain
    pub fn new(id: TeamId, roster: &[UnitClass], spawn_xs: &[f32], terrain: &Terrain, first_id: u32) -> Self {
        let units = roster
            .iter()
            .zip(spawn_xs)
            .enumerate()
            .map(|(index, (&class, &x))| {
                let mut unit = Unit::new(first_id + index as u32, id, index, class, Vec2::new(x, 0.0));
                unit.set_feet(terrain.surface_below(x, -UNIT_HEIGHT));
                unit
            })
            .collect();
        Self {
            id,
            units,
            ammo: AmmoPool::default(),
            score: 0,
            selected: Some(0),
        }
    }

    pub fn living(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_active())
    }

    /// A team is defeated once every member is at 0 HP
    pub fn is_defeated(&self) -> bool {
        self.units.iter().all(|u| u.hp == 0)
    }

    pub fn first_living(&self) -> Option<usize> {
        self.units.iter().position(|u| u.is_active())
    }

    pub fn selected_unit(&self) -> Result<usize, ActionError> {
        let index = self.selected.ok_or(ActionError::NoSelectedUnit)?;
        match self.units.get(index) {
            Some(unit) if unit.is_active() => Ok(index),
            Some(_) => Err(ActionError::UnitEliminated(index)),
            None => Err(ActionError::InvalidUnit(index)),
        }
    }

    pub fn select(&mut self, index: usize) -> Result<(), ActionError> {
        match self.units.get(index) {
            Some(unit) if unit.is_active() => {
                self.selected = Some(index);
                Ok(())
            }
            Some(_) => Err(ActionError::UnitEliminated(index)),
            None => Err(ActionError::InvalidUnit(index)),
        }
    }
}
