//! Strategy parameters for the turtle engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleConfig {
    pub strat1_breakout: usize,
    pub strat1_exit: usize,
    pub strat2_breakout: usize,
    pub strat2_exit: usize,
    pub atr_period: usize,
    /// Stop distance in units of ATR.
    pub stop_multiplier: f64,
    /// Favourable move, in units of ATR, required before adding a unit.
    pub scale_trigger_multiplier: f64,
    pub market_risk_limit: u32,
    pub direction_risk_limit: u32,
    pub capital_risk_per_trade: f64,
    /// Divisor applied to risk capital while cumulative realized profit is negative.
    pub drawdown_capital_multiplier: f64,
    pub starting_capital: f64,
    /// When true, every intent is treated as filled at its reference price.
    pub simulate_fills: bool,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        TurtleConfig {
            strat1_breakout: 20,
            strat1_exit: 10,
            strat2_breakout: 55,
            strat2_exit: 20,
            atr_period: 20,
            stop_multiplier: 2.0,
            scale_trigger_multiplier: 0.5,
            market_risk_limit: 4,
            direction_risk_limit: 12,
            capital_risk_per_trade: 0.01,
            drawdown_capital_multiplier: 2.0,
            starting_capital: 100_000.0,
            simulate_fills: true,
        }
    }
}

impl TurtleConfig {
    /// Number of bars a price window must hold: the longest lookback plus the
    /// in-progress bar.
    pub fn min_window_len(&self) -> usize {
        let longest = self
            .strat1_breakout
            .max(self.strat1_exit)
            .max(self.strat2_breakout)
            .max(self.strat2_exit)
            .max(self.atr_period + 1);
        longest + 1
    }
}
