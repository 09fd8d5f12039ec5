//! Breakout entry detection.
//!
//! Variant selection is a strict hierarchy: a market whose last strat1
//! trade won only watches the strat2 (55-bar) levels; otherwise only the
//! strat1 (20-bar) levels are evaluated.

use crate::domain::config::TurtleConfig;
use crate::domain::indicators::Indicators;
use crate::domain::order::{OrderAction, OrderIntent, OrderKind};
use crate::domain::position::{Direction, PositionState, StrategyVariant, TradeOutcome};
use crate::domain::risk_budget::RiskBudget;
use crate::domain::sizing::unit_size;
use crate::domain::universe::Market;
use tracing::debug;

pub fn select_variant(position: &PositionState) -> StrategyVariant {
    match position.last_strat1_outcome {
        TradeOutcome::Won => StrategyVariant::Strat2,
        TradeOutcome::Lost | TradeOutcome::Unknown => StrategyVariant::Strat1,
    }
}

/// Direction of a breakout through `variant`'s levels, if any.
pub fn breakout_direction(
    indicators: &Indicators,
    variant: StrategyVariant,
    price: f64,
) -> Option<Direction> {
    if price >= indicators.breakout_level(variant, Direction::Long) {
        Some(Direction::Long)
    } else if price <= indicators.breakout_level(variant, Direction::Short) {
        Some(Direction::Short)
    } else {
        None
    }
}

/// Open the first unit on a breakout.
///
/// The unit fills at the observed price and the stop sits
/// `stop_multiplier` ATRs behind it. Nothing is reserved from the budget
/// when the unit size is zero.
///
/// The fill reference is the observed price, not the breakout level: a
/// 100 breakout seen at 101 records `last_fill_price = 101` and a stop of
/// `101 - 2 * ATR`. Scale triggers and staggered profit measure from it.
pub fn detect_entry(
    position: &mut PositionState,
    market: &Market,
    indicators: &Indicators,
    price: f64,
    budget: &mut RiskBudget,
    risk_capital: f64,
    config: &TurtleConfig,
) -> Option<OrderIntent> {
    if !position.is_flat() {
        return None;
    }

    let variant = select_variant(position);
    let direction = breakout_direction(indicators, variant, price)?;

    let quantity = unit_size(risk_capital, market.contract_multiplier, indicators.atr);
    if quantity == 0 {
        debug!(symbol = %market.symbol, atr = indicators.atr, "entry suppressed: zero unit size");
        return None;
    }

    if !budget.try_reserve(direction, position) {
        debug!(symbol = %market.symbol, ?direction, "entry denied: risk budget exhausted");
        return None;
    }

    let sign = direction.sign() as f64;
    let stop = price - sign * config.stop_multiplier * indicators.atr;
    position.open(direction, variant, quantity, price, stop);

    debug!(symbol = %market.symbol, ?variant, ?direction, price, stop, "breakout entry");

    Some(OrderIntent::new(
        &market.symbol,
        OrderAction::Enter,
        direction.sign(),
        quantity,
        price,
        OrderKind::Limit,
    ))
}
