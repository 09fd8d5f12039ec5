//! Per-market history and the unified replay timeline.

use crate::domain::bar::PriceBar;
use crate::domain::error::TurtleError;
use crate::domain::price_window::PriceWindow;
use crate::domain::rollover::ContractSnapshot;
use crate::domain::universe::Universe;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct MarketData {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub contracts: HashMap<NaiveDate, ContractSnapshot>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl MarketData {
    pub fn new(
        symbol: String,
        bars: Vec<PriceBar>,
        contracts: Vec<(NaiveDate, ContractSnapshot)>,
    ) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            symbol,
            bars,
            contracts: contracts.into_iter().collect(),
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    /// Up to `len` bars ending with the bar on `date`, which is treated as
    /// the in-progress bar. `None` when the market has no bar that day.
    pub fn window_at(&self, date: NaiveDate, len: usize) -> Option<PriceWindow> {
        let idx = *self.date_index.get(&date)?;
        Some(PriceWindow::trailing(&self.bars[..=idx], len))
    }

    pub fn contract_at(&self, date: NaiveDate) -> Option<&ContractSnapshot> {
        self.contracts.get(&date)
    }
}

pub fn build_unified_timeline(markets: &[MarketData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = markets
        .iter()
        .flat_map(|m| m.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

/// Load history for every market in the universe.
///
/// A market whose feed cannot be read is kept with no bars, so it stays
/// untradable for the whole replay instead of aborting it.
pub fn load_market_data(
    data_port: &dyn DataPort,
    universe: &Universe,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<MarketData>, TurtleError> {
    let mut loaded = Vec::with_capacity(universe.count());
    for symbol in universe.symbols() {
        let bars = match data_port.fetch_bars(symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol, error = %e, "no price history, market will stay untradable");
                Vec::new()
            }
        };
        let contracts = if bars.is_empty() {
            Vec::new()
        } else {
            data_port.fetch_contracts(symbol, start_date, end_date)?
        };
        loaded.push(MarketData::new(symbol.to_string(), bars, contracts));
    }

    if loaded.iter().all(|m| m.bars.is_empty()) {
        return Err(TurtleError::Data {
            reason: "no price history for any market in the universe".into(),
        });
    }
    Ok(loaded)
}
