//! Territory Wars - turn-based artillery combat core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, ballistics, combat, turns, CPU policy)
//! - `settings`: Match configuration
//! - `error`: Rejection reasons for player intents
//! - `logging`: Logger setup for native binaries

pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod settings;
pub mod sim;

pub use error::ActionError;
pub use settings::{MapVariant, MatchSettings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions (y grows downward)
    pub const WORLD_WIDTH: f32 = 1200.0;
    pub const WORLD_HEIGHT: f32 = 700.0;
    /// Top of the indestructible ground plane
    pub const GROUND_Y: f32 = 620.0;
    pub const GRAVITY: f32 = 600.0;

    /// Unit body box (position is the body centre)
    pub const UNIT_WIDTH: f32 = 30.0;
    pub const UNIT_HEIGHT: f32 = 42.0;
    /// Base walking speed (px/s), scaled by class speed
    pub const WALK_SPEED: f32 = 120.0;
    /// Highest ledge a unit can climb onto
    pub const CLIMB_REACH: f32 = 150.0;

    /// Turn budget
    pub const STEP_DISTANCE: f32 = 70.0;
    pub const ATTACK_STEP_COST: u32 = 2;
    pub const TURN_TIME_SECS: f32 = 30.0;

    /// Wind is re-rolled every turn in [-WIND_MAX, WIND_MAX]
    pub const WIND_MAX: f32 = 60.0;

    /// Grenade
    pub const GRENADE_POWER_SCALE: f32 = 7.0;
    pub const GRENADE_WIND_FACTOR: f32 = 0.5;
    pub const GRENADE_RESTITUTION: f32 = 0.6;
    pub const GRENADE_FUSE_SECS: f32 = 2.5;
    pub const GRENADE_RADIUS: f32 = 60.0;
    pub const GRENADE_PEAK: f32 = 40.0;
    /// A new bounce cannot register within this window of the last one
    pub const BOUNCE_DEBOUNCE_SECS: f32 = 0.05;

    /// Rifle
    pub const RIFLE_SPEED: f32 = 900.0;
    pub const RIFLE_WIND_FACTOR: f32 = 0.3;
    pub const RIFLE_RICOCHETS: u8 = 2;
    pub const RIFLE_RESTITUTION: f32 = 0.9;
    pub const RIFLE_BODY_DAMAGE: u32 = 20;
    pub const RIFLE_HEADSHOT_DAMAGE: u32 = 35;

    /// Bazooka
    pub const ROCKET_POWER_SCALE: f32 = 8.0;
    pub const ROCKET_WIND_FACTOR: f32 = 0.4;
    pub const ROCKET_GRAVITY_SCALE: f32 = 0.5;
    pub const ROCKET_FUSE_SECS: f32 = 3.0;
    pub const ROCKET_RADIUS: f32 = 80.0;
    pub const ROCKET_PEAK: f32 = 60.0;

    /// Boot (melee)
    pub const MELEE_RANGE: f32 = 50.0;
    pub const MELEE_DAMAGE: u32 = 25;

    pub const PROJECTILE_RADIUS: f32 = 4.0;
    /// Knockback impulse at point-blank (px/s)
    pub const KNOCKBACK_STRENGTH: f32 = 260.0;

    /// Shared ammo pool
    pub const INITIAL_GRENADES: u32 = 3;
    pub const INITIAL_RIFLE: u32 = 10;
    pub const INITIAL_BAZOOKA: u32 = 2;
    pub const MAX_GRENADES: u32 = 5;
    pub const MAX_RIFLE: u32 = 15;
    pub const MAX_BAZOOKA: u32 = 3;

    /// Medic
    pub const HEAL_AMOUNT: u32 = 30;
    pub const HEAL_CAP: u32 = 100;
    pub const HEAL_RANGE: f32 = 80.0;
    pub const HEAL_THRESHOLD: f32 = 0.8;

    /// Power-ups
    pub const MAX_POWERUPS: usize = 3;
    pub const POWERUP_INTERVAL_SECS: f32 = 8.0;
    pub const PICKUP_RADIUS: f32 = 30.0;
    pub const PICKUP_HEALTH: u32 = 50;

    /// Score awarded to the opposing team per elimination
    pub const KILL_SCORE: u32 = 1;

    /// Pause between CPU attacks (and before the first one of a turn)
    pub const CPU_ACTION_DELAY_SECS: f32 = 0.6;
}

/// Unit direction for an angle in radians, measured counter-clockwise from +x
/// with screen-up positive.
#[inline]
pub fn aim_direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), -angle.sin())
}

/// Inverse of [`aim_direction`]
#[inline]
pub fn aim_angle(dir: Vec2) -> f32 {
    (-dir.y).atan2(dir.x)
}

/// Linear falloff shared by explosions and terrain damage:
/// `round((1 - dist/radius) * peak)`, zero at or beyond the radius.
#[inline]
pub fn falloff_damage(dist: f32, radius: f32, peak: f32) -> u32 {
    if radius <= 0.0 || !dist.is_finite() || dist >= radius {
        return 0;
    }
    let scale = 1.0 - dist.max(0.0) / radius;
    (scale * peak).round().max(0.0) as u32
}
