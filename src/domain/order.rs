//! Abstract order intents emitted by the engine.
//!
//! Intents are value objects. The engine never tracks broker state beyond
//! the ticket of the last unfilled intent per market.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Enter,
    Scale,
    Exit,
    Rollover,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Stop,
    Market,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Monotonic per engine; zero until emitted.
    pub ticket: u64,
    pub symbol: String,
    pub action: OrderAction,
    /// Side of the order flow: +1 buy, -1 sell, 0 for net-flat actions
    /// (rollover, cancel).
    pub direction: i32,
    /// Contracts to trade. Rollover intents carry the full signed position.
    pub quantity: i64,
    pub price: f64,
    pub kind: OrderKind,
    /// Ticket being cancelled, for `OrderAction::Cancel`.
    pub cancels: Option<u64>,
    /// Contract closed by a rollover.
    pub from_contract: Option<String>,
    /// Contract opened by a rollover.
    pub to_contract: Option<String>,
}

impl OrderIntent {
    /// Build an unticketed intent; the engine assigns the ticket on emission.
    pub fn new(
        symbol: &str,
        action: OrderAction,
        direction: i32,
        quantity: i64,
        price: f64,
        kind: OrderKind,
    ) -> Self {
        OrderIntent {
            ticket: 0,
            symbol: symbol.to_string(),
            action,
            direction,
            quantity,
            price,
            kind,
            cancels: None,
            from_contract: None,
            to_contract: None,
        }
    }

    pub fn cancel(symbol: &str, stale: u64) -> Self {
        OrderIntent {
            cancels: Some(stale),
            ..OrderIntent::new(symbol, OrderAction::Cancel, 0, 0, 0.0, OrderKind::Market)
        }
    }

    pub fn with_ticket(mut self, ticket: u64) -> Self {
        self.ticket = ticket;
        self
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::Enter => "enter",
            OrderAction::Scale => "scale",
            OrderAction::Exit => "exit",
            OrderAction::Rollover => "rollover",
            OrderAction::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderKind::Limit => "limit",
            OrderKind::Stop => "stop",
            OrderKind::Market => "market",
        };
        f.write_str(s)
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            OrderAction::Cancel => write!(
                f,
                "#{} cancel {} #{}",
                self.ticket,
                self.symbol,
                self.cancels.unwrap_or_default()
            ),
            _ => write!(
                f,
                "#{} {} {} {:+} x{} @{:.2} ({})",
                self.ticket,
                self.action,
                self.symbol,
                self.direction,
                self.quantity,
                self.price,
                self.kind
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_enter() {
        let intent =
            OrderIntent::new("ES", OrderAction::Enter, 1, 3, 4512.5, OrderKind::Limit).with_ticket(7);
        assert_eq!(intent.to_string(), "#7 enter ES +1 x3 @4512.50 (limit)");
    }

    #[test]
    fn display_cancel() {
        let intent = OrderIntent::cancel("CL", 4).with_ticket(9);
        assert_eq!(intent.to_string(), "#9 cancel CL #4");
        assert_eq!(intent.action, OrderAction::Cancel);
        assert_eq!(intent.direction, 0);
    }
}
