//! Pyramid scale-in detection.

use crate::domain::config::TurtleConfig;
use crate::domain::indicators::Indicators;
use crate::domain::order::{OrderAction, OrderIntent, OrderKind};
use crate::domain::position::PositionState;
use crate::domain::risk_budget::RiskBudget;
use crate::domain::sizing::unit_size;
use crate::domain::universe::Market;
use tracing::debug;

/// Add one unit once price has moved `scale_trigger_multiplier` ATRs past
/// the last fill in the position's direction.
///
/// At most one unit per call. The stop trails to `stop_multiplier` ATRs
/// behind the new fill; the strategy variant never changes.
pub fn detect_scale(
    position: &mut PositionState,
    market: &Market,
    indicators: &Indicators,
    price: f64,
    budget: &mut RiskBudget,
    risk_capital: f64,
    config: &TurtleConfig,
) -> Option<OrderIntent> {
    let direction = position.direction()?;
    if position.units() >= config.market_risk_limit {
        return None;
    }

    let sign = direction.sign() as f64;
    let trigger = position.last_fill_price + sign * config.scale_trigger_multiplier * indicators.atr;
    let favourable = (price - trigger) * sign >= 0.0;
    if !favourable {
        return None;
    }

    let quantity = unit_size(risk_capital, market.contract_multiplier, indicators.atr);
    if quantity == 0 {
        debug!(symbol = %market.symbol, atr = indicators.atr, "scale suppressed: zero unit size");
        return None;
    }

    if !budget.try_reserve(direction, position) {
        debug!(symbol = %market.symbol, ?direction, "scale denied: risk budget exhausted");
        return None;
    }

    let stop = price - sign * config.stop_multiplier * indicators.atr;
    position.add_unit(quantity, price, stop);

    debug!(
        symbol = %market.symbol,
        stage = position.scale_in_stage,
        price,
        stop,
        "scale in"
    );

    Some(OrderIntent::new(
        &market.symbol,
        OrderAction::Scale,
        direction.sign(),
        quantity,
        price,
        OrderKind::Limit,
    ))
}
