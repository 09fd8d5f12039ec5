//! Contract roll detection.
//!
//! A roll is a change in the reported auto-close date against the stored
//! one. The first observation of a market only initialises bookkeeping.

use crate::domain::order::{OrderAction, OrderIntent, OrderKind};
use crate::domain::position::PositionState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Current contract identity reported for a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub contract_id: String,
    pub auto_close_date: NaiveDate,
}

/// Carry an open position into the new contract when a roll is detected.
///
/// The intent closes the old contract and re-opens the same signed
/// quantity in the new one at `price`. Stage, stop and outcome memory are
/// untouched. The stored contract reference is updated whether or not a
/// position exists.
pub fn detect_rollover(
    position: &mut PositionState,
    snapshot: &ContractSnapshot,
    price: f64,
) -> Option<OrderIntent> {
    let previous_date = position.contract_auto_close_date;
    let previous_contract = position.contract_id.clone();

    position.contract_auto_close_date = Some(snapshot.auto_close_date);
    position.contract_id = Some(snapshot.contract_id.clone());

    match previous_date {
        None => None,
        Some(date) if date == snapshot.auto_close_date => None,
        Some(_) if position.is_flat() => {
            info!(
                symbol = %position.symbol,
                contract = %snapshot.contract_id,
                "contract rolled with no open position"
            );
            None
        }
        Some(_) => {
            info!(
                symbol = %position.symbol,
                from = ?previous_contract,
                to = %snapshot.contract_id,
                quantity = position.quantity,
                "rolling position"
            );
            Some(OrderIntent {
                from_contract: previous_contract,
                to_contract: Some(snapshot.contract_id.clone()),
                ..OrderIntent::new(
                    &position.symbol,
                    OrderAction::Rollover,
                    0,
                    position.quantity,
                    price,
                    OrderKind::Limit,
                )
            })
        }
    }
}
