//! Global long/short unit budget.
//!
//! The budget is rebuilt from the position set at the start of every cycle.
//! Within a cycle, reservations are granted first-come in canonical market
//! order; the in-memory counters are the only cycle-scoped mutable state.

use crate::domain::config::TurtleConfig;
use crate::domain::position::{Direction, PositionState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBudget {
    pub long_units_used: u32,
    pub short_units_used: u32,
    pub direction_limit: u32,
    pub market_limit: u32,
}

impl RiskBudget {
    pub fn from_positions(positions: &[PositionState], config: &TurtleConfig) -> Self {
        let mut budget = RiskBudget {
            long_units_used: 0,
            short_units_used: 0,
            direction_limit: config.direction_risk_limit,
            market_limit: config.market_risk_limit,
        };
        for pos in positions {
            match pos.direction() {
                Some(Direction::Long) => budget.long_units_used += pos.units(),
                Some(Direction::Short) => budget.short_units_used += pos.units(),
                None => {}
            }
        }
        budget
    }

    pub fn units_used(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Long => self.long_units_used,
            Direction::Short => self.short_units_used,
        }
    }

    /// Remaining units in `direction`, floored at zero.
    pub fn available(&self, direction: Direction) -> u32 {
        self.direction_limit
            .saturating_sub(self.units_used(direction))
    }

    /// Reserve one unit for `position` in `direction`.
    ///
    /// Fails when the direction is exhausted, the market is already at its
    /// depth limit, or the market holds the opposite direction.
    pub fn try_reserve(&mut self, direction: Direction, position: &PositionState) -> bool {
        if self.available(direction) == 0 {
            return false;
        }
        if position.units() >= self.market_limit {
            return false;
        }
        if position.direction().is_some_and(|d| d != direction) {
            return false;
        }
        match direction {
            Direction::Long => self.long_units_used += 1,
            Direction::Short => self.short_units_used += 1,
        }
        true
    }

    /// Return `units` to the budget after a close.
    pub fn release(&mut self, direction: Direction, units: u32) {
        match direction {
            Direction::Long => {
                self.long_units_used = self.long_units_used.saturating_sub(units)
            }
            Direction::Short => {
                self.short_units_used = self.short_units_used.saturating_sub(units)
            }
        }
    }
}
