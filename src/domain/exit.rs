//! Exit and stop detection with realized profit accounting.

use crate::domain::config::TurtleConfig;
use crate::domain::indicators::Indicators;
use crate::domain::order::{OrderAction, OrderIntent, OrderKind};
use crate::domain::position::{Direction, PositionState, StrategyVariant, TradeOutcome};
use crate::domain::risk_budget::RiskBudget;
use crate::domain::universe::Market;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopBreach,
    ExitBreakout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub variant: StrategyVariant,
    pub direction: Direction,
    pub units: u32,
    pub quantity: i64,
    pub exit_price: f64,
    pub reason: ExitReason,
    /// Sum of per-unit price gains.
    pub realized_points: f64,
    /// Points scaled by contracts per unit and the contract multiplier.
    pub realized_profit: f64,
}

/// Realized points over `units` staggered entries.
///
/// Unit k (1-based) is assumed filled `step` ATRs behind the last fill:
/// entry_k = last_fill - direction * step * (k-1) * atr.
pub fn staggered_profit(
    direction: Direction,
    units: u32,
    last_fill_price: f64,
    exit_price: f64,
    atr: f64,
    step: f64,
) -> f64 {
    let sign = direction.sign() as f64;
    (1..=units)
        .map(|k| {
            let entry = last_fill_price - sign * step * (k - 1) as f64 * atr;
            (exit_price - entry) * sign
        })
        .sum()
}

fn exit_reason(position: &PositionState, indicators: &Indicators, price: f64) -> Option<ExitReason> {
    let direction = position.direction()?;
    if position.stop_breached(price) {
        return Some(ExitReason::StopBreach);
    }
    let variant = position.strategy_variant?;
    let level = indicators.exit_level(variant, direction);
    let crossed = match direction {
        Direction::Long => price <= level,
        Direction::Short => price >= level,
    };
    crossed.then_some(ExitReason::ExitBreakout)
}

/// Close the whole position on a stop breach or an adverse exit breakout.
///
/// Releases the position's units back to `budget`. Only strat1 closes
/// update the per-market outcome memory.
pub fn detect_exit(
    position: &mut PositionState,
    market: &Market,
    indicators: &Indicators,
    price: f64,
    budget: &mut RiskBudget,
    config: &TurtleConfig,
) -> Option<(OrderIntent, ClosedTrade)> {
    let reason = exit_reason(position, indicators, price)?;
    let direction = position.direction()?;
    let variant = position.strategy_variant?;
    let units = position.units();

    let realized_points = staggered_profit(
        direction,
        units,
        position.last_fill_price,
        price,
        indicators.atr,
        config.scale_trigger_multiplier,
    );
    let realized_profit = realized_points * position.unit_quantity() * market.contract_multiplier;

    if variant == StrategyVariant::Strat1 {
        position.last_strat1_outcome = if realized_points > 0.0 {
            TradeOutcome::Won
        } else {
            TradeOutcome::Lost
        };
    }

    let trade = ClosedTrade {
        symbol: market.symbol.clone(),
        variant,
        direction,
        units,
        quantity: position.quantity,
        exit_price: price,
        reason,
        realized_points,
        realized_profit,
    };

    let kind = match reason {
        ExitReason::StopBreach => OrderKind::Stop,
        ExitReason::ExitBreakout => OrderKind::Market,
    };
    let intent = OrderIntent::new(
        &market.symbol,
        OrderAction::Exit,
        direction.opposite().sign(),
        position.quantity.abs(),
        price,
        kind,
    );

    budget.release(direction, units);
    position.close();

    debug!(symbol = %market.symbol, ?reason, realized_points, "position closed");

    Some((intent, trade))
}
