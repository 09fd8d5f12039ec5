//! Day-by-day replay of historical data through the engine.
//!
//! Each timeline date is one session: indicators are refreshed from windows
//! ending on that date, contract identity is checked, then a single
//! evaluation runs against the day's close.

use crate::domain::engine::{Engine, EngineState};
use crate::domain::error::TurtleError;
use crate::domain::exit::ClosedTrade;
use crate::domain::market_data::MarketData;
use crate::ports::intent_sink::IntentSink;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub sessions: usize,
    pub intents: usize,
    pub closed_trades: Vec<ClosedTrade>,
    pub final_state: EngineState,
}

impl ReplaySummary {
    pub fn realized_profit(&self) -> f64 {
        self.final_state.realized_profit
    }

    pub fn win_count(&self) -> usize {
        self.closed_trades
            .iter()
            .filter(|t| t.realized_points > 0.0)
            .count()
    }
}

pub fn run_replay(
    engine: &Engine,
    state: EngineState,
    markets: &[MarketData],
    timeline: &[NaiveDate],
    sink: &mut dyn IntentSink,
) -> Result<ReplaySummary, TurtleError> {
    let window_len = engine.config().min_window_len();
    let mut state = state;
    let mut intents = 0;
    let mut closed_trades = Vec::new();

    for &date in timeline {
        let windows: HashMap<_, _> = markets
            .iter()
            .filter_map(|m| Some((m.symbol.clone(), m.window_at(date, window_len)?)))
            .collect();
        let (refreshed, report) = engine.refresh_indicators(state, &windows);
        debug!(%date, tradable = report.refreshed.len(), "session open");

        let prices: HashMap<_, _> = markets
            .iter()
            .filter_map(|m| {
                let close = m.get_bar(date)?.close;
                close.is_finite().then(|| (m.symbol.clone(), close))
            })
            .collect();
        let contracts: HashMap<_, _> = markets
            .iter()
            .filter_map(|m| Some((m.symbol.clone(), m.contract_at(date)?.clone())))
            .collect();

        let rolled = engine.roll_contracts(refreshed, &contracts, &prices)?;
        sink.record(date, &rolled.intents)?;
        intents += rolled.intents.len();

        let cycle = engine.evaluate(rolled.state, &prices)?;
        sink.record(date, &cycle.intents)?;
        intents += cycle.intents.len();
        closed_trades.extend(cycle.closed_trades);
        state = cycle.state;
    }
    sink.flush()?;

    info!(
        sessions = timeline.len(),
        intents,
        closed = closed_trades.len(),
        realized_profit = state.realized_profit,
        "replay complete"
    );

    Ok(ReplaySummary {
        sessions: timeline.len(),
        intents,
        closed_trades,
        final_state: state,
    })
}
