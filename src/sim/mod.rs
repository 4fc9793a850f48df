//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (team A before B, then unit index)
//! - No rendering or platform dependencies

pub mod ai;
pub mod ballistics;
pub mod collision;
pub mod combat;
pub mod los;
pub mod powerups;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod turn;
pub mod units;

pub use ai::{BattleView, CpuAction, CpuStrategy, strategy_for};
pub use ballistics::{Projectile, ProjectileKind, ProjectileOutcome};
pub use collision::CollisionResult;
pub use combat::{MatchOutcome, apply_direct_hit, apply_explosion, check_win_conditions, explosion_damage};
pub use los::{has_line_of_sight, is_in_cover};
pub use powerups::{PowerUp, PowerUpKind};
pub use snapshot::Snapshot;
pub use state::{GameEvent, GameState, MatchPhase, MatchState};
pub use terrain::{Platform, Terrain};
pub use tick::{FireCommand, TickInput, fire, move_unit, tick};
pub use turn::{StepBudget, TurnPhase, TurnState};
pub use units::{AmmoPool, Team, TeamId, Unit, UnitClass, WeaponKind};
