//! Health and ammo pickups dropped onto the battlefield on a timer

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use super::units::{Team, TeamId};
use crate::consts::*;

/// Pickups never spawn closer than this to the side walls
const SPAWN_MARGIN: f32 = 40.0;
/// Height of a pickup's centre above the surface it rests on
const REST_HEIGHT: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Health,
    Ammo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub collected: bool,
}

/// A pickup claimed this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub id: u32,
    pub kind: PowerUpKind,
    pub team: TeamId,
    pub index: usize,
    /// HP restored (health pickups only)
    pub healed: u32,
}

/// Fixed-interval spawn clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpSpawner {
    timer: f32,
    interval: f32,
}

impl PowerUpSpawner {
    pub fn new(interval: f32) -> Self {
        Self { timer: interval, interval }
    }

    /// Advance the clock. True once per elapsed interval.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.timer += self.interval;
            true
        } else {
            false
        }
    }

    /// Drop a pickup at a random x, resting on whatever surface is there.
    /// Nothing spawns while `MAX_POWERUPS` are already out.
    pub fn spawn<R: Rng>(&self, id: u32, powerups: &mut Vec<PowerUp>, terrain: &Terrain, rng: &mut R) -> Option<PowerUp> {
        if powerups.len() >= MAX_POWERUPS {
            return None;
        }
        let x = rng.random_range(SPAWN_MARGIN..WORLD_WIDTH - SPAWN_MARGIN);
        let kind = if rng.random_bool(0.5) {
            PowerUpKind::Health
        } else {
            PowerUpKind::Ammo
        };
        let powerup = PowerUp {
            id,
            kind,
            pos: Vec2::new(x, terrain.surface_below(x, f32::MIN) - REST_HEIGHT),
            collected: false,
        };
        powerups.push(powerup.clone());
        Some(powerup)
    }
}

/// Hand each pickup to the first living unit inside the pickup radius
/// (team A before team B, then unit order) and drop collected ones.
pub fn collect(powerups: &mut Vec<PowerUp>, teams: &mut [Team; 2]) -> Vec<Pickup> {
    let mut claimed = Vec::new();
    for powerup in powerups.iter_mut() {
        let claimant = teams.iter().flat_map(|t| t.units.iter()).find(|u| {
            u.is_active() && u.pos.distance(powerup.pos) <= PICKUP_RADIUS
        });
        let Some(unit) = claimant else {
            continue;
        };
        let (team, index) = (unit.team, unit.index);

        let healed = match powerup.kind {
            PowerUpKind::Health => teams[team.index()].units[index].heal_capped(PICKUP_HEALTH, HEAL_CAP),
            PowerUpKind::Ammo => {
                teams[team.index()].ammo.replenish();
                0
            }
        };
        powerup.collected = true;
        log::debug!("{:?} pickup {} claimed by {:?} unit {}", powerup.kind, powerup.id, team, index);
        claimed.push(Pickup {
            id: powerup.id,
            kind: powerup.kind,
            team,
            index,
            healed,
        });
    }
    powerups.retain(|p| !p.collected);
    claimed
}
