//! Turn controller: whose turn it is, the step budget and the turn countdown
//!
//! Countdowns are plain fields advanced by the tick, never host timers.

use serde::{Deserialize, Serialize};

use super::units::TeamId;
use crate::ActionError;
use crate::consts::STEP_DISTANCE;

/// Slack for float accumulation when a walked distance reaches a full step
const STEP_EPSILON: f32 = 1e-3;

/// Controller state as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    PlayerTurn,
    CpuTurn,
    /// Terminal until restart
    GameOver,
}

/// Per-turn step budget.
///
/// Only `remaining` is stored, so `used + remaining == max` cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepBudget {
    max: u32,
    remaining: u32,
    /// Distance walked toward the next step
    carry: f32,
}

impl StepBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
            carry: 0.0,
        }
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[inline]
    pub fn used(&self) -> u32 {
        self.max - self.remaining
    }

    pub fn carry(&self) -> f32 {
        self.carry
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn reset(&mut self) {
        self.remaining = self.max;
        self.carry = 0.0;
    }

    /// Spend whole steps (attacks). Leaves the budget untouched on failure.
    pub fn try_spend(&mut self, steps: u32) -> Result<(), ActionError> {
        if self.remaining < steps {
            return Err(ActionError::InsufficientSteps {
                needed: steps,
                remaining: self.remaining,
            });
        }
        self.remaining -= steps;
        if self.remaining == 0 {
            self.carry = 0.0;
        }
        Ok(())
    }

    /// Distance that can still be walked this turn
    pub fn walk_allowance(&self) -> f32 {
        (self.remaining as f32 * STEP_DISTANCE - self.carry).max(0.0)
    }

    /// Pay for up to `distance` of walking; every full `STEP_DISTANCE`
    /// consumes one step. Returns the distance granted.
    pub fn walk(&mut self, distance: f32) -> f32 {
        if !distance.is_finite() || distance <= 0.0 {
            return 0.0;
        }
        let granted = distance.min(self.walk_allowance());
        self.carry += granted;
        while self.remaining > 0 && self.carry >= STEP_DISTANCE - STEP_EPSILON {
            self.carry = (self.carry - STEP_DISTANCE).max(0.0);
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            self.carry = 0.0;
        }
        granted
    }
}

/// Turn state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub active: TeamId,
    budgets: [StepBudget; 2],
    /// Seconds left before the turn is forced over
    countdown: f32,
    turn_time: f32,
    /// Turns started this match (first turn is 1)
    pub turn_number: u32,
}

impl TurnState {
    pub fn new(max_steps: u32, turn_time: f32) -> Self {
        Self {
            active: TeamId::A,
            budgets: [StepBudget::new(max_steps); 2],
            countdown: turn_time,
            turn_time,
            turn_number: 1,
        }
    }

    pub fn budget(&self, team: TeamId) -> &StepBudget {
        &self.budgets[team.index()]
    }

    pub fn budget_mut(&mut self, team: TeamId) -> &mut StepBudget {
        &mut self.budgets[team.index()]
    }

    pub fn active_budget(&self) -> &StepBudget {
        self.budget(self.active)
    }

    pub fn countdown_secs(&self) -> f32 {
        self.countdown
    }

    pub fn countdown_ms(&self) -> u32 {
        (self.countdown.max(0.0) * 1000.0).round() as u32
    }

    pub fn turn_time(&self) -> f32 {
        self.turn_time
    }

    /// Advance the countdown. Returns true when it ran out this tick.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.countdown -= dt;
        self.countdown <= 0.0
    }

    /// Hand the turn to the other side: reset its budget and the timer.
    pub fn end_turn(&mut self) -> TeamId {
        let next = self.active.opponent();
        self.budgets[next.index()].reset();
        self.countdown = self.turn_time;
        self.active = next;
        self.turn_number += 1;
        next
    }
}
