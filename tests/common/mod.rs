#![allow(dead_code)]

use chrono::NaiveDate;
pub use turtlecore::domain::bar::PriceBar;
use turtlecore::domain::config::TurtleConfig;
use turtlecore::domain::engine::Engine;
use turtlecore::domain::error::TurtleError;
use turtlecore::domain::order::OrderIntent;
use turtlecore::domain::price_window::PriceWindow;
use turtlecore::domain::rollover::ContractSnapshot;
use turtlecore::domain::universe::Universe;
use turtlecore::ports::data_port::DataPort;
use turtlecore::ports::intent_sink::IntentSink;
use std::collections::HashMap;

pub struct MockDataPort {
    pub bars: HashMap<String, Vec<PriceBar>>,
    pub contracts: HashMap<String, Vec<(NaiveDate, ContractSnapshot)>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            contracts: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_contract(mut self, symbol: &str, date: NaiveDate, id: &str, auto_close: NaiveDate) -> Self {
        self.contracts.entry(symbol.to_string()).or_default().push((
            date,
            ContractSnapshot {
                contract_id: id.to_string(),
                auto_close_date: auto_close,
            },
        ));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TurtleError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TurtleError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_contracts(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, ContractSnapshot)>, TurtleError> {
        Ok(self.contracts.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TurtleError> {
        let mut symbols: Vec<String> = self.bars.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Sink that keeps every recorded batch in memory.
#[derive(Default)]
pub struct CollectingSink {
    pub batches: Vec<(NaiveDate, Vec<OrderIntent>)>,
}

impl CollectingSink {
    pub fn all(&self) -> Vec<&OrderIntent> {
        self.batches.iter().flat_map(|(_, b)| b.iter()).collect()
    }
}

impl IntentSink for CollectingSink {
    fn record(&mut self, date: NaiveDate, intents: &[OrderIntent]) -> Result<(), TurtleError> {
        if !intents.is_empty() {
            self.batches.push((date, intents.to_vec()));
        }
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` daily bars from `start`, every one with the same high, low and close.
pub fn channel_bars(start: NaiveDate, count: usize, high: f64, low: f64, close: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| PriceBar::new(start + chrono::Duration::days(i as i64), high, low, close))
        .collect()
}

/// 56 bars ranging 90..100 with closes at 95: every level is 100/90, ATR is 10.
pub fn channel_window() -> PriceWindow {
    PriceWindow::new(channel_bars(date(2024, 1, 1), 56, 100.0, 90.0, 95.0))
}

/// Older bars range 80..120, the last 21 range 90..100.
///
/// 20-bar levels are 100/90 while 55-bar levels are 120/80.
pub fn two_tier_window() -> PriceWindow {
    let mut bars = channel_bars(date(2024, 1, 1), 35, 120.0, 80.0, 100.0);
    bars.extend(channel_bars(date(2024, 2, 5), 21, 100.0, 90.0, 95.0));
    PriceWindow::new(bars)
}

/// Last 10 completed bars range 150..160, so the 10-bar exit low is 150.
pub fn rallied_window() -> PriceWindow {
    let mut bars = channel_bars(date(2024, 1, 1), 45, 100.0, 90.0, 95.0);
    bars.extend(channel_bars(date(2024, 2, 15), 11, 160.0, 150.0, 155.0));
    PriceWindow::new(bars)
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Universe over `list` with every contract multiplier forced to 1.
pub fn unit_universe(list: &[&str]) -> Universe {
    let syms = symbols(list);
    let multipliers = syms.iter().map(|s| (s.clone(), 1.0)).collect();
    Universe::from_symbols(&syms, &multipliers).unwrap()
}

pub fn engine(list: &[&str]) -> Engine {
    Engine::new(TurtleConfig::default(), unit_universe(list)).unwrap()
}

pub fn engine_with(list: &[&str], config: TurtleConfig) -> Engine {
    Engine::new(config, unit_universe(list)).unwrap()
}

pub fn windows(list: &[&str], window: &PriceWindow) -> HashMap<String, PriceWindow> {
    list.iter().map(|s| (s.to_string(), window.clone())).collect()
}

pub fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

pub fn uniform_prices(list: &[&str], price: f64) -> HashMap<String, f64> {
    list.iter().map(|s| (s.to_string(), price)).collect()
}

pub const FOURTEEN: [&str; 14] = [
    "BP", "CD", "CL", "ED", "GC", "HG", "HO", "HU", "JY", "SB", "SF", "SP", "SV", "TB",
];
