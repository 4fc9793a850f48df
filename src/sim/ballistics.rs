//! Ballistics for grenades, rifle bullets and rockets
//!
//! Explicit integrators with substepping so fast bullets cannot skip through
//! thin platforms or units. Fuses and ricochet counters only ever count down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::reflect_velocity;
use super::los::has_line_of_sight;
use super::terrain::Terrain;
use super::units::{Team, TeamId, UnitClass, WeaponKind};
use crate::aim_direction;
use crate::consts::*;

/// Substep length cap (px)
const MAX_SUBSTEP_DISTANCE: f32 = 4.0;
const MAX_PROJECTILE_SUBSTEPS: usize = 32;
/// Spawn offset from the shooter's body centre
const MUZZLE_OFFSET: f32 = 24.0;
/// Anything leaving this box is discarded without detonating
const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;
const CEILING_Y: f32 = -3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Grenade,
    Bullet,
    Rocket,
}

impl ProjectileKind {
    pub fn for_weapon(weapon: WeaponKind) -> Option<Self> {
        match weapon {
            WeaponKind::Grenade => Some(ProjectileKind::Grenade),
            WeaponKind::Rifle => Some(ProjectileKind::Bullet),
            WeaponKind::Bazooka => Some(ProjectileKind::Rocket),
            WeaponKind::Boot => None,
        }
    }

    fn gravity(self) -> f32 {
        match self {
            ProjectileKind::Grenade => GRAVITY,
            ProjectileKind::Bullet => 0.0,
            ProjectileKind::Rocket => GRAVITY * ROCKET_GRAVITY_SCALE,
        }
    }

    /// Blast radius and peak damage for explosive kinds
    pub fn blast(self) -> Option<(f32, f32)> {
        match self {
            ProjectileKind::Grenade => Some((GRENADE_RADIUS, GRENADE_PEAK)),
            ProjectileKind::Rocket => Some((ROCKET_RADIUS, ROCKET_PEAK)),
            ProjectileKind::Bullet => None,
        }
    }
}

/// What ends a projectile's life
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Charge {
    /// Detonates when it reaches zero, whatever it is touching
    Fuse { remaining: f32 },
    /// Terrain bounces left before the next contact destroys it
    Ricochets { remaining: u8 },
}

/// Result of advancing a projectile one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileOutcome {
    Flying,
    Detonate { pos: Vec2, radius: f32, peak: f32 },
    HitUnit { team: TeamId, index: usize, damage: u32, headshot: bool, point: Vec2 },
    /// Left the world or ran out of ricochets
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: TeamId,
    /// Index of the firing unit within its team
    pub shooter: usize,
    pub shooter_class: UnitClass,
    pub charge: Charge,
    /// Time left before another bounce can register
    pub bounce_cooldown: f32,
    pub bounces: u32,
    /// Last launch or ricochet point, for bullet line-of-sight
    pub origin: Vec2,
}

impl Projectile {
    /// Launch a projectile for `weapon`. `power` is 0-100 and ignored by the rifle.
    /// Wind is applied once, as a horizontal velocity offset.
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        id: u32,
        weapon: WeaponKind,
        from: Vec2,
        angle: f32,
        power: f32,
        wind: f32,
        owner: TeamId,
        shooter: usize,
        shooter_class: UnitClass,
    ) -> Option<Self> {
        let kind = ProjectileKind::for_weapon(weapon)?;
        let power = if power.is_finite() { power.clamp(0.0, 100.0) } else { 0.0 };
        let angle = if angle.is_finite() { angle } else { 0.0 };
        let wind = if wind.is_finite() { wind } else { 0.0 };
        let dir = aim_direction(angle);

        let (speed, wind_factor, charge) = match kind {
            ProjectileKind::Grenade => (
                power * GRENADE_POWER_SCALE,
                GRENADE_WIND_FACTOR,
                Charge::Fuse { remaining: GRENADE_FUSE_SECS },
            ),
            ProjectileKind::Bullet => (
                RIFLE_SPEED,
                RIFLE_WIND_FACTOR,
                Charge::Ricochets { remaining: RIFLE_RICOCHETS },
            ),
            ProjectileKind::Rocket => (
                power * ROCKET_POWER_SCALE,
                ROCKET_WIND_FACTOR,
                Charge::Fuse { remaining: ROCKET_FUSE_SECS },
            ),
        };

        let pos = from + dir * MUZZLE_OFFSET;
        Some(Self {
            id,
            kind,
            pos,
            vel: dir * speed + Vec2::new(wind * wind_factor, 0.0),
            owner,
            shooter,
            shooter_class,
            charge,
            bounce_cooldown: 0.0,
            bounces: 0,
            origin: pos,
        })
    }

    pub fn fuse_remaining(&self) -> Option<f32> {
        match self.charge {
            Charge::Fuse { remaining } => Some(remaining),
            Charge::Ricochets { .. } => None,
        }
    }

    pub fn ricochets_remaining(&self) -> Option<u8> {
        match self.charge {
            Charge::Ricochets { remaining } => Some(remaining),
            Charge::Fuse { .. } => None,
        }
    }

    fn out_of_bounds(&self) -> bool {
        self.pos.x < -OUT_OF_BOUNDS_MARGIN
            || self.pos.x > WORLD_WIDTH + OUT_OF_BOUNDS_MARGIN
            || self.pos.y > WORLD_HEIGHT + OUT_OF_BOUNDS_MARGIN
            || self.pos.y < CEILING_Y
            || !self.pos.is_finite()
    }

    /// Advance one tick against the terrain and (for bullets) the units.
    /// Enemy units are tested before friendly ones; the shooter is skipped.
    pub fn advance(&mut self, dt: f32, terrain: &Terrain, teams: &[Team; 2]) -> ProjectileOutcome {
        let travel = self.vel.length() * dt;
        let substeps = ((travel / MAX_SUBSTEP_DISTANCE).ceil() as usize).clamp(1, MAX_PROJECTILE_SUBSTEPS);
        let step_dt = dt / substeps as f32;
        let gravity = self.kind.gravity();

        for _ in 0..substeps {
            self.bounce_cooldown = (self.bounce_cooldown - step_dt).max(0.0);
            self.vel.y += gravity * step_dt;
            self.pos += self.vel * step_dt;

            if self.out_of_bounds() {
                return ProjectileOutcome::Expired;
            }

            if self.kind == ProjectileKind::Bullet {
                if let Some(hit) = self.bullet_hit(terrain, teams) {
                    return hit;
                }
            }

            let Some(contact) = terrain.collide_circle(self.pos, PROJECTILE_RADIUS) else {
                continue;
            };
            self.pos += contact.normal * contact.penetration;
            let approaching = self.vel.dot(contact.normal) < 0.0;

            match (self.kind, &mut self.charge) {
                (ProjectileKind::Bullet, Charge::Ricochets { remaining }) => {
                    if *remaining == 0 {
                        return ProjectileOutcome::Expired;
                    }
                    *remaining -= 1;
                    self.vel = reflect_velocity(self.vel, contact.normal) * RIFLE_RESTITUTION;
                    self.bounces += 1;
                    self.origin = self.pos;
                }
                (ProjectileKind::Grenade, _) if approaching => {
                    if self.bounce_cooldown <= 0.0 {
                        self.vel = reflect_velocity(self.vel, contact.normal) * GRENADE_RESTITUTION;
                        self.bounce_cooldown = BOUNCE_DEBOUNCE_SECS;
                        self.bounces += 1;
                    } else {
                        // Debounced: slide along the surface instead of bouncing again
                        self.vel -= contact.normal * self.vel.dot(contact.normal);
                    }
                }
                (ProjectileKind::Rocket, _) => {
                    // Rockets come to rest and wait for the fuse
                    self.vel = Vec2::ZERO;
                }
                _ => {}
            }
        }

        if let Charge::Fuse { remaining } = &mut self.charge {
            *remaining = (*remaining - dt).max(0.0);
            if *remaining <= 0.0 {
                let (radius, peak) = self.kind.blast().unwrap_or((GRENADE_RADIUS, GRENADE_PEAK));
                return ProjectileOutcome::Detonate { pos: self.pos, radius, peak };
            }
        }

        ProjectileOutcome::Flying
    }

    fn bullet_hit(&self, terrain: &Terrain, teams: &[Team; 2]) -> Option<ProjectileOutcome> {
        let enemies = &teams[self.owner.opponent().index()].units;
        let friends = teams[self.owner.index()]
            .units
            .iter()
            .filter(|u| u.index != self.shooter);

        let unit = enemies
            .iter()
            .chain(friends)
            .filter(|u| u.is_active())
            .find(|u| u.contains(self.pos, PROJECTILE_RADIUS) && has_line_of_sight(terrain, self.origin, u.pos))?;

        let headshot = unit.is_headshot(self.pos);
        let base = if headshot { RIFLE_HEADSHOT_DAMAGE } else { RIFLE_BODY_DAMAGE };
        Some(ProjectileOutcome::HitUnit {
            team: unit.team,
            index: unit.index,
            damage: self.shooter_class.scale_damage(base),
            headshot,
            point: self.pos,
        })
    }
}
