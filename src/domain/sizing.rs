//! Unit ("trade") sizing with drawdown throttling.

use crate::domain::config::TurtleConfig;

/// Capital at risk per unit.
///
/// Tradable capital is starting capital plus cumulative realized profit,
/// floored at zero. While cumulative realized profit is negative the result
/// is divided by `drawdown_capital_multiplier`.
pub fn risk_capital(config: &TurtleConfig, realized_profit: f64) -> f64 {
    let tradable = (config.starting_capital + realized_profit).max(0.0);
    let base = tradable * config.capital_risk_per_trade;
    if realized_profit < 0.0 {
        base / config.drawdown_capital_multiplier
    } else {
        base
    }
}

/// floor(risk_capital / (contract_multiplier * atr)); zero when ATR is zero
/// or undefined.
pub fn unit_size(risk_capital: f64, contract_multiplier: f64, atr: f64) -> i64 {
    let dollar_volatility = contract_multiplier * atr;
    if !(dollar_volatility.is_finite() && dollar_volatility > 0.0) {
        return 0;
    }
    let units = (risk_capital / dollar_volatility).floor();
    if units.is_finite() && units > 0.0 {
        units as i64
    } else {
        0
    }
}
