//! Configuration loading and validation.
//!
//! Reads the `[turtle]`, `[universe]` and `[multipliers]` sections through
//! [`ConfigPort`], falling back to the classic parameter set for absent keys.
//! A key that is present but malformed is an error, never a silent default.

use crate::domain::config::TurtleConfig;
use crate::domain::error::TurtleError;
use crate::domain::universe::{parse_symbols, Universe};
use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;
use std::str::FromStr;

const SECTION: &str = "turtle";

fn invalid(key: &str, reason: &str) -> TurtleError {
    TurtleError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub fn build_turtle_config(config: &dyn ConfigPort) -> Result<TurtleConfig, TurtleError> {
    let d = TurtleConfig::default();
    let built = TurtleConfig {
        strat1_breakout: read_window(config, "strat1_breakout", d.strat1_breakout)?,
        strat1_exit: read_window(config, "strat1_exit", d.strat1_exit)?,
        strat2_breakout: read_window(config, "strat2_breakout", d.strat2_breakout)?,
        strat2_exit: read_window(config, "strat2_exit", d.strat2_exit)?,
        atr_period: read_window(config, "atr_period", d.atr_period)?,
        stop_multiplier: read_number(config, "stop_multiplier", d.stop_multiplier)?,
        scale_trigger_multiplier: read_number(
            config,
            "scale_trigger_multiplier",
            d.scale_trigger_multiplier,
        )?,
        market_risk_limit: read_limit(config, "market_risk_limit", d.market_risk_limit)?,
        direction_risk_limit: read_limit(config, "direction_risk_limit", d.direction_risk_limit)?,
        capital_risk_per_trade: read_number(
            config,
            "capital_risk_per_trade",
            d.capital_risk_per_trade,
        )?,
        drawdown_capital_multiplier: read_number(
            config,
            "drawdown_capital_multiplier",
            d.drawdown_capital_multiplier,
        )?,
        starting_capital: read_number(config, "starting_capital", d.starting_capital)?,
        simulate_fills: read_flag(config, "simulate_fills", d.simulate_fills)?,
    };
    validate_turtle_config(&built)?;
    Ok(built)
}

/// Raw trimmed value of a `[turtle]` key, `None` when absent.
fn raw(config: &dyn ConfigPort, key: &str) -> Option<String> {
    config
        .get_string(SECTION, key)
        .map(|v| v.trim().to_string())
}

/// Absent keys take `default`; a present key that does not parse is fatal.
fn read_parsed<T: FromStr>(
    config: &dyn ConfigPort,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, TurtleError> {
    match raw(config, key) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| invalid(key, &format!("not {expected}: {value}"))),
    }
}

fn read_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, TurtleError> {
    read_parsed(config, key, default, "a number")
}

fn read_window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, TurtleError> {
    let value: i64 = read_parsed(config, key, default as i64, "an integer")?;
    usize::try_from(value).map_err(|_| invalid(key, "window length must be non-negative"))
}

fn read_limit(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, TurtleError> {
    let value: i64 = read_parsed(config, key, i64::from(default), "an integer")?;
    u32::try_from(value).map_err(|_| invalid(key, "limit must be non-negative"))
}

fn read_flag(config: &dyn ConfigPort, key: &str, default: bool) -> Result<bool, TurtleError> {
    let Some(value) = raw(config, key) else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, &format!("not a boolean: {value}"))),
    }
}

pub fn validate_turtle_config(config: &TurtleConfig) -> Result<(), TurtleError> {
    validate_windows(config)?;
    validate_multipliers(config)?;
    validate_limits(config)?;
    validate_capital(config)?;
    Ok(())
}

fn validate_windows(config: &TurtleConfig) -> Result<(), TurtleError> {
    let windows = [
        ("strat1_breakout", config.strat1_breakout),
        ("strat1_exit", config.strat1_exit),
        ("strat2_breakout", config.strat2_breakout),
        ("strat2_exit", config.strat2_exit),
        ("atr_period", config.atr_period),
    ];
    for (key, value) in windows {
        if value < 1 {
            return Err(invalid(key, "window length must be at least 1"));
        }
    }
    Ok(())
}

fn validate_multipliers(config: &TurtleConfig) -> Result<(), TurtleError> {
    if !(config.stop_multiplier.is_finite() && config.stop_multiplier > 0.0) {
        return Err(invalid("stop_multiplier", "stop_multiplier must be positive"));
    }
    if !(config.scale_trigger_multiplier.is_finite() && config.scale_trigger_multiplier > 0.0) {
        return Err(invalid(
            "scale_trigger_multiplier",
            "scale_trigger_multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_limits(config: &TurtleConfig) -> Result<(), TurtleError> {
    if config.market_risk_limit < 1 {
        return Err(invalid("market_risk_limit", "market_risk_limit must be at least 1"));
    }
    if config.direction_risk_limit < config.market_risk_limit {
        return Err(invalid(
            "direction_risk_limit",
            "direction_risk_limit must not be below market_risk_limit",
        ));
    }
    Ok(())
}

fn validate_capital(config: &TurtleConfig) -> Result<(), TurtleError> {
    let risk = config.capital_risk_per_trade;
    if !(risk > 0.0 && risk <= 1.0) {
        return Err(invalid(
            "capital_risk_per_trade",
            "capital_risk_per_trade must be between 0 and 1",
        ));
    }
    if !(config.drawdown_capital_multiplier >= 1.0 && config.drawdown_capital_multiplier.is_finite())
    {
        return Err(invalid(
            "drawdown_capital_multiplier",
            "drawdown_capital_multiplier must be at least 1",
        ));
    }
    if !(config.starting_capital.is_finite() && config.starting_capital > 0.0) {
        return Err(invalid("starting_capital", "starting_capital must be positive"));
    }
    Ok(())
}

/// Build the market universe from `[universe] symbols` and optional
/// `[multipliers]` overrides.
pub fn build_universe(config: &dyn ConfigPort) -> Result<Universe, TurtleError> {
    let raw = match config.get_string("universe", "symbols") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(TurtleError::ConfigMissing {
                section: "universe".to_string(),
                key: "symbols".to_string(),
            })
        }
    };
    let symbols = parse_symbols(&raw)?;

    let mut multipliers = HashMap::new();
    for symbol in &symbols {
        let Some(value) = config.get_string("multipliers", symbol) else {
            continue;
        };
        let parsed = value
            .trim()
            .parse::<f64>()
            .map_err(|_| TurtleError::ConfigInvalid {
                section: "multipliers".to_string(),
                key: symbol.clone(),
                reason: format!("not a number: {}", value.trim()),
            })?;
        multipliers.insert(symbol.clone(), parsed);
    }

    Universe::from_symbols(&symbols, &multipliers)
}
