//! Per-market position state machine.
//!
//! `stage` is the signed pyramid depth: its sign is the direction, its
//! magnitude the number of units held. Transitions:
//! - `0 → ±1` entry
//! - `k → k±1` same-sign scale-in
//! - `k → 0` exit or stop
//!
//! Rollover leaves the stage untouched and only swaps the contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    pub fn from_stage(stage: i32) -> Option<Direction> {
        match stage {
            s if s > 0 => Some(Direction::Long),
            s if s < 0 => Some(Direction::Short),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyVariant {
    /// 20-bar breakout, 10-bar exit.
    Strat1,
    /// 55-bar breakout, 20-bar exit.
    Strat2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradeOutcome {
    Won,
    Lost,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub symbol: String,
    pub scale_in_stage: i32,
    pub strategy_variant: Option<StrategyVariant>,
    /// Signed contract count; sign matches the stage.
    pub quantity: i64,
    pub average_price: f64,
    pub last_fill_price: f64,
    pub stop_price: Option<f64>,
    pub contract_id: Option<String>,
    pub contract_auto_close_date: Option<NaiveDate>,
    pub last_strat1_outcome: TradeOutcome,
    /// Ticket of the last intent not yet confirmed by a fill (live mode only).
    pub pending_ticket: Option<u64>,
}

impl PositionState {
    pub fn flat(symbol: &str) -> Self {
        PositionState {
            symbol: symbol.to_string(),
            scale_in_stage: 0,
            strategy_variant: None,
            quantity: 0,
            average_price: 0.0,
            last_fill_price: 0.0,
            stop_price: None,
            contract_id: None,
            contract_auto_close_date: None,
            last_strat1_outcome: TradeOutcome::Unknown,
            pending_ticket: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.scale_in_stage == 0
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_stage(self.scale_in_stage)
    }

    pub fn units(&self) -> u32 {
        self.scale_in_stage.unsigned_abs()
    }

    /// Contracts per pyramid unit, averaged over the units held.
    pub fn unit_quantity(&self) -> f64 {
        match self.units() {
            0 => 0.0,
            n => self.quantity.unsigned_abs() as f64 / n as f64,
        }
    }

    /// Price at or beyond the stop, against the position.
    pub fn stop_breached(&self, price: f64) -> bool {
        match (self.direction(), self.stop_price) {
            (Some(Direction::Long), Some(stop)) => price <= stop,
            (Some(Direction::Short), Some(stop)) => price >= stop,
            _ => false,
        }
    }

    /// Open the first unit.
    pub fn open(
        &mut self,
        direction: Direction,
        variant: StrategyVariant,
        quantity: i64,
        fill_price: f64,
        stop_price: f64,
    ) {
        self.scale_in_stage = direction.sign();
        self.strategy_variant = Some(variant);
        self.quantity = quantity * direction.sign() as i64;
        self.average_price = fill_price;
        self.last_fill_price = fill_price;
        self.stop_price = Some(stop_price);
    }

    /// Add one unit in the existing direction.
    pub fn add_unit(&mut self, quantity: i64, fill_price: f64, stop_price: f64) {
        let Some(direction) = self.direction() else {
            return;
        };
        let held = self.quantity.unsigned_abs() as f64;
        let added = quantity as f64;
        self.average_price = (self.average_price * held + fill_price * added) / (held + added);
        self.scale_in_stage += direction.sign();
        self.quantity += quantity * direction.sign() as i64;
        self.last_fill_price = fill_price;
        self.stop_price = Some(stop_price);
    }

    /// Reset trade fields to flat. Contract identity and outcome memory survive.
    pub fn close(&mut self) {
        self.scale_in_stage = 0;
        self.strategy_variant = None;
        self.quantity = 0;
        self.average_price = 0.0;
        self.last_fill_price = 0.0;
        self.stop_price = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> PositionState {
        let mut p = PositionState::flat("ES");
        p.open(Direction::Long, StrategyVariant::Strat1, 3, 100.0, 90.0);
        p
    }

    #[test]
    fn flat_state_is_empty() {
        let p = PositionState::flat("ES");
        assert!(p.is_flat());
        assert_eq!(p.quantity, 0);
        assert!(p.stop_price.is_none());
        assert_eq!(p.last_strat1_outcome, TradeOutcome::Unknown);
        assert!(p.direction().is_none());
    }

    #[test]
    fn open_short_sets_negative_stage_and_quantity() {
        let mut p = PositionState::flat("CL");
        p.open(Direction::Short, StrategyVariant::Strat2, 2, 80.0, 84.0);
        assert_eq!(p.scale_in_stage, -1);
        assert_eq!(p.quantity, -2);
        assert_eq!(p.strategy_variant, Some(StrategyVariant::Strat2));
        assert_eq!(p.stop_price, Some(84.0));
    }

    #[test]
    fn add_unit_keeps_sign_and_averages_price() {
        let mut p = long_position();
        p.add_unit(3, 110.0, 100.0);
        assert_eq!(p.scale_in_stage, 2);
        assert_eq!(p.quantity, 6);
        assert!((p.average_price - 105.0).abs() < 1e-9);
        assert!((p.last_fill_price - 110.0).abs() < f64::EPSILON);
        assert_eq!(p.stop_price, Some(100.0));
        assert_eq!(p.strategy_variant, Some(StrategyVariant::Strat1));
    }

    #[test]
    fn add_unit_on_flat_is_ignored() {
        let mut p = PositionState::flat("ES");
        p.add_unit(3, 110.0, 100.0);
        assert!(p.is_flat());
        assert_eq!(p.quantity, 0);
    }

    #[test]
    fn stop_breach_long_and_short() {
        let p = long_position();
        assert!(p.stop_breached(90.0));
        assert!(p.stop_breached(89.0));
        assert!(!p.stop_breached(91.0));

        let mut s = PositionState::flat("CL");
        s.open(Direction::Short, StrategyVariant::Strat1, 1, 80.0, 84.0);
        assert!(s.stop_breached(84.0));
        assert!(!s.stop_breached(83.0));
    }

    #[test]
    fn close_keeps_contract_and_memory() {
        let mut p = long_position();
        p.contract_id = Some("ESH4".into());
        p.last_strat1_outcome = TradeOutcome::Won;
        p.close();
        assert!(p.is_flat());
        assert_eq!(p.quantity, 0);
        assert!(p.stop_price.is_none());
        assert!(p.strategy_variant.is_none());
        assert_eq!(p.contract_id.as_deref(), Some("ESH4"));
        assert_eq!(p.last_strat1_outcome, TradeOutcome::Won);
    }

    #[test]
    fn unit_quantity() {
        let mut p = long_position();
        p.add_unit(5, 110.0, 100.0);
        assert!((p.unit_quantity() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn direction_from_stage() {
        assert_eq!(Direction::from_stage(3), Some(Direction::Long));
        assert_eq!(Direction::from_stage(-1), Some(Direction::Short));
        assert_eq!(Direction::from_stage(0), None);
        assert_eq!(Direction::Long.opposite(), Direction::Short);
    }
}
