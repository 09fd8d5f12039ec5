//! Tradable market universe and the built-in futures catalogue.
//!
//! The universe fixes the canonical market order. That order is the
//! tie-break for risk budget allocation, so it is preserved exactly as
//! configured.

use crate::domain::error::TurtleError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// (root symbol, continuous feed, contract multiplier)
const CATALOGUE: &[(&str, &str, f64)] = &[
    ("BP", "british pound", 62_500.0),
    ("CD", "canadian dollar", 100_000.0),
    ("CL", "crude oil", 1_000.0),
    ("ED", "eurodollar", 2_500.0),
    ("GC", "gold", 100.0),
    ("HG", "copper", 25_000.0),
    ("HO", "heating oil", 42_000.0),
    ("HU", "unleaded gasoline", 42_000.0),
    ("JY", "japanese yen", 12_500_000.0),
    ("SB", "sugar", 112_000.0),
    ("SF", "swiss franc", 125_000.0),
    ("SP", "s&p 500", 250.0),
    ("SV", "silver", 5_000.0),
    ("TB", "treasury bill", 2_500.0),
    ("TY", "10-year note", 1_000.0),
    ("US", "30-year bond", 1_000.0),
    ("CN", "corn", 50.0),
    ("SY", "soybeans", 50.0),
    ("WC", "wheat", 50.0),
    ("ES", "e-mini s&p 500", 50.0),
    ("NQ", "e-mini nasdaq 100", 20.0),
    ("YM", "e-mini dow", 5.0),
    ("QM", "e-mini crude oil", 500.0),
    ("FV", "5-year note", 1_000.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub symbol: String,
    /// Reference to the continuous-instrument feed.
    pub feed: String,
    pub contract_multiplier: f64,
}

/// Look up a root symbol in the built-in catalogue.
pub fn catalogue_market(symbol: &str) -> Option<Market> {
    CATALOGUE
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|(s, feed, mult)| Market {
            symbol: s.to_string(),
            feed: format!("continuous {}", feed),
            contract_multiplier: *mult,
        })
}

pub fn catalogue() -> Vec<Market> {
    CATALOGUE
        .iter()
        .filter_map(|(s, _, _)| catalogue_market(s))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    markets: Vec<Market>,
}

impl Universe {
    /// Build a universe from catalogue symbols, in the given order.
    ///
    /// `multipliers` overrides catalogue contract multipliers.
    pub fn from_symbols(
        symbols: &[String],
        multipliers: &HashMap<String, f64>,
    ) -> Result<Self, TurtleError> {
        if symbols.is_empty() {
            return Err(TurtleError::EmptyUniverse);
        }

        let mut seen = HashSet::new();
        let mut markets = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let mut market =
                catalogue_market(symbol).ok_or_else(|| TurtleError::UnknownMarket {
                    symbol: symbol.clone(),
                })?;
            if !seen.insert(symbol.clone()) {
                return Err(TurtleError::DuplicateMarket {
                    symbol: symbol.clone(),
                });
            }
            if let Some(&mult) = multipliers.get(symbol) {
                if !(mult.is_finite() && mult > 0.0) {
                    return Err(TurtleError::ConfigInvalid {
                        section: "multipliers".into(),
                        key: symbol.clone(),
                        reason: "contract multiplier must be positive".into(),
                    });
                }
                market.contract_multiplier = mult;
            }
            markets.push(market);
        }

        Ok(Universe { markets })
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.markets.iter().map(|m| m.symbol.as_str())
    }

    pub fn get(&self, symbol: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.symbol == symbol)
    }

    pub fn count(&self) -> usize {
        self.markets.len()
    }
}

/// Split a comma-separated symbol list, trimming and upper-casing each token.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, TurtleError> {
    let mut symbols = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TurtleError::ConfigInvalid {
                section: "universe".into(),
                key: "symbols".into(),
                reason: "empty token in symbol list".into(),
            });
        }
        symbols.push(trimmed.to_uppercase());
    }
    Ok(symbols)
}
