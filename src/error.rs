//! Rejection reasons for player and CPU intents
//!
//! A rejected intent leaves the simulation untouched; the tick only logs it.

use thiserror::Error;

use crate::sim::WeaponKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("match is over")]
    MatchOver,
    #[error("it is not this side's turn")]
    NotYourTurn,
    #[error("no unit selected")]
    NoSelectedUnit,
    #[error("unit {0} has been eliminated")]
    UnitEliminated(usize),
    #[error("no unit at index {0}")]
    InvalidUnit(usize),
    #[error("out of {0:?} ammo")]
    OutOfAmmo(WeaponKind),
    #[error("needs {needed} steps, {remaining} remaining")]
    InsufficientSteps { needed: u32, remaining: u32 },
    #[error("no target in range")]
    NoTarget,
    #[error("action cooldown active")]
    CooldownActive,
}
