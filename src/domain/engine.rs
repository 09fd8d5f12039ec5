//! Cycle orchestrator.
//!
//! All mutable strategy state lives in an explicit [`EngineState`] value.
//! Each entry point takes the prior state plus inputs and returns the next
//! state with the intents it produced; the host decides the cadence:
//! - [`Engine::refresh_indicators`] at session open, from fresh windows
//! - [`Engine::roll_contracts`] whenever contract identity is reported
//! - [`Engine::evaluate`] at every intracycle check, from current prices
//!
//! Markets are always visited in canonical universe order, which is the
//! tie-break for the shared risk budget.

use crate::domain::config::TurtleConfig;
use crate::domain::config_validation::validate_turtle_config;
use crate::domain::entry::detect_entry;
use crate::domain::error::TurtleError;
use crate::domain::exit::{detect_exit, ClosedTrade};
use crate::domain::indicators::{compute_indicators, Indicators, Untradable};
use crate::domain::order::OrderIntent;
use crate::domain::position::{Direction, PositionState};
use crate::domain::price_window::PriceWindow;
use crate::domain::risk_budget::RiskBudget;
use crate::domain::rollover::{detect_rollover, ContractSnapshot};
use crate::domain::scaling::detect_scale;
use crate::domain::sizing;
use crate::domain::universe::Universe;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// One entry per market, in canonical universe order.
    pub positions: Vec<PositionState>,
    /// Last good indicators per market; kept stale while a market is untradable.
    pub indicators: BTreeMap<String, Indicators>,
    pub tradable: BTreeSet<String>,
    pub realized_profit: f64,
    pub closed_trades: Vec<ClosedTrade>,
    pub next_ticket: u64,
}

/// Stop the host should keep armed for an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOrder {
    pub symbol: String,
    pub position_direction: Direction,
    pub quantity: i64,
    pub stop_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTelemetry {
    pub long_units_used: u32,
    pub short_units_used: u32,
    pub stages: Vec<(String, i32)>,
    /// Tradable markets whose ATR was zero or undefined this cycle.
    pub zero_atr: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionReport {
    pub refreshed: Vec<String>,
    pub untradable: Vec<(String, Untradable)>,
}

#[derive(Debug, Clone)]
pub struct CycleResult {
    pub state: EngineState,
    pub intents: Vec<OrderIntent>,
    pub closed_trades: Vec<ClosedTrade>,
    pub telemetry: RiskTelemetry,
}

/// Position feedback from the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub symbol: String,
    /// Signed contracts now held.
    pub quantity: i64,
    pub average_price: f64,
}

impl EngineState {
    pub fn position(&self, symbol: &str) -> Option<&PositionState> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn is_tradable(&self, symbol: &str) -> bool {
        self.tradable.contains(symbol)
    }

    pub fn budget(&self, config: &TurtleConfig) -> RiskBudget {
        RiskBudget::from_positions(&self.positions, config)
    }

    pub fn desired_stops(&self) -> Vec<StopOrder> {
        self.positions
            .iter()
            .filter_map(|p| {
                Some(StopOrder {
                    symbol: p.symbol.clone(),
                    position_direction: p.direction()?,
                    quantity: p.quantity.abs(),
                    stop_price: p.stop_price?,
                })
            })
            .collect()
    }

    pub fn check_invariants(&self, config: &TurtleConfig) -> Result<(), TurtleError> {
        let violation = |symbol: &str, reason: String| TurtleError::InvariantViolation {
            symbol: symbol.to_string(),
            reason,
        };

        for p in &self.positions {
            if p.units() > config.market_risk_limit {
                return Err(violation(
                    &p.symbol,
                    format!("stage {} beyond market limit", p.scale_in_stage),
                ));
            }
            if p.quantity.signum() != i64::from(p.scale_in_stage.signum()) {
                return Err(violation(
                    &p.symbol,
                    format!("quantity {} disagrees with stage {}", p.quantity, p.scale_in_stage),
                ));
            }
            if p.stop_price.is_some() == p.is_flat() {
                return Err(violation(&p.symbol, "stop set iff position open".into()));
            }
        }

        let budget = self.budget(config);
        for direction in [Direction::Long, Direction::Short] {
            if budget.units_used(direction) > config.direction_risk_limit {
                return Err(violation(
                    "*",
                    format!(
                        "{:?} units {} beyond direction limit",
                        direction,
                        budget.units_used(direction)
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl RiskTelemetry {
    fn capture(positions: &[PositionState], budget: &RiskBudget, zero_atr: Vec<String>) -> Self {
        RiskTelemetry {
            long_units_used: budget.long_units_used,
            short_units_used: budget.short_units_used,
            stages: positions
                .iter()
                .map(|p| (p.symbol.clone(), p.scale_in_stage))
                .collect(),
            zero_atr,
        }
    }
}

pub struct Engine {
    config: TurtleConfig,
    universe: Universe,
}

impl Engine {
    pub fn new(config: TurtleConfig, universe: Universe) -> Result<Self, TurtleError> {
        validate_turtle_config(&config)?;
        Ok(Engine { config, universe })
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Every market flat, nothing tradable until the first refresh.
    pub fn initial_state(&self) -> EngineState {
        EngineState {
            positions: self.universe.symbols().map(PositionState::flat).collect(),
            indicators: BTreeMap::new(),
            tradable: BTreeSet::new(),
            realized_profit: 0.0,
            closed_trades: Vec::new(),
            next_ticket: 0,
        }
    }

    /// Session-open refresh of indicators from fresh price windows.
    ///
    /// Markets with a missing, short or NaN-bearing window become untradable
    /// for the session and keep their previous indicators.
    pub fn refresh_indicators(
        &self,
        mut state: EngineState,
        windows: &HashMap<String, PriceWindow>,
    ) -> (EngineState, SessionReport) {
        let mut report = SessionReport::default();

        for market in self.universe.markets() {
            let symbol = &market.symbol;
            let computed = match windows.get(symbol) {
                Some(window) => compute_indicators(window, &self.config),
                None => Err(Untradable::MissingData),
            };
            match computed {
                Ok(indicators) => {
                    state.indicators.insert(symbol.clone(), indicators);
                    state.tradable.insert(symbol.clone());
                    report.refreshed.push(symbol.clone());
                }
                Err(reason) => {
                    warn!(symbol = %symbol, ?reason, "market dropped for session");
                    state.tradable.remove(symbol);
                    report.untradable.push((symbol.clone(), reason));
                }
            }
        }

        info!(
            refreshed = report.refreshed.len(),
            dropped = report.untradable.len(),
            "indicators refreshed"
        );
        (state, report)
    }

    /// Compare reported contract identity against stored identity and carry
    /// open positions across rolls.
    pub fn roll_contracts(
        &self,
        mut state: EngineState,
        contracts: &HashMap<String, ContractSnapshot>,
        prices: &HashMap<String, f64>,
    ) -> Result<CycleResult, TurtleError> {
        self.ensure_aligned(&state)?;
        let mut intents = Vec::new();

        for (i, market) in self.universe.markets().iter().enumerate() {
            let Some(snapshot) = contracts.get(&market.symbol) else {
                continue;
            };
            let position = &mut state.positions[i];
            let price = prices
                .get(&market.symbol)
                .copied()
                .filter(|p| p.is_finite())
                .unwrap_or(position.last_fill_price);

            if let Some(intent) = detect_rollover(position, snapshot, price) {
                self.emit(&mut state.next_ticket, position, intent, &mut intents);
            }
        }

        let budget = state.budget(&self.config);
        let telemetry = RiskTelemetry::capture(&state.positions, &budget, Vec::new());
        state.check_invariants(&self.config)?;
        Ok(CycleResult {
            state,
            intents,
            closed_trades: Vec::new(),
            telemetry,
        })
    }

    /// Run exits, then scale-ins and entries, against current prices.
    ///
    /// Exits run for every market first so that released units are available
    /// to later markets. A market closed in this cycle does not re-enter
    /// until the next one.
    pub fn evaluate(
        &self,
        mut state: EngineState,
        prices: &HashMap<String, f64>,
    ) -> Result<CycleResult, TurtleError> {
        self.ensure_aligned(&state)?;
        let config = &self.config;
        let markets = self.universe.markets();

        let mut budget = state.budget(config);
        let risk_capital = sizing::risk_capital(config, state.realized_profit);
        let mut intents = Vec::new();
        let mut closed = Vec::new();
        let mut zero_atr = Vec::new();

        let quotes: Vec<Option<f64>> = markets
            .iter()
            .map(|market| {
                if !state.is_tradable(&market.symbol) {
                    return None;
                }
                let price = prices.get(&market.symbol).copied().filter(|p| p.is_finite());
                if price.is_none() {
                    warn!(symbol = %market.symbol, "no current price, market skipped");
                }
                price
            })
            .collect();

        let mut closed_now = vec![false; markets.len()];
        for (i, market) in markets.iter().enumerate() {
            let (Some(price), Some(indicators)) = (quotes[i], state.indicators.get(&market.symbol))
            else {
                continue;
            };
            let position = &mut state.positions[i];
            if let Some((intent, trade)) =
                detect_exit(position, market, indicators, price, &mut budget, config)
            {
                self.emit(&mut state.next_ticket, position, intent, &mut intents);
                state.realized_profit += trade.realized_profit;
                closed.push(trade);
                closed_now[i] = true;
            }
        }

        for (i, market) in markets.iter().enumerate() {
            let (Some(price), Some(indicators)) = (quotes[i], state.indicators.get(&market.symbol))
            else {
                continue;
            };
            if !indicators.has_usable_atr() {
                zero_atr.push(market.symbol.clone());
            }
            if closed_now[i] {
                continue;
            }
            let position = &mut state.positions[i];
            let intent = if position.is_flat() {
                detect_entry(position, market, indicators, price, &mut budget, risk_capital, config)
            } else {
                detect_scale(position, market, indicators, price, &mut budget, risk_capital, config)
            };
            if let Some(intent) = intent {
                self.emit(&mut state.next_ticket, position, intent, &mut intents);
            }
        }

        state.closed_trades.extend(closed.iter().cloned());
        let telemetry = RiskTelemetry::capture(&state.positions, &budget, zero_atr);
        state.check_invariants(config)?;

        Ok(CycleResult {
            state,
            intents,
            closed_trades: closed,
            telemetry,
        })
    }

    /// Apply execution feedback to one market.
    ///
    /// Clears the market's pending ticket. A zero quantity on an open
    /// position resets it to flat; a non-zero quantity on a flat market or
    /// against the held direction is rejected.
    pub fn apply_fill(
        &self,
        mut state: EngineState,
        fill: &FillReport,
    ) -> Result<EngineState, TurtleError> {
        let mismatch = |reason: &str| TurtleError::FillMismatch {
            symbol: fill.symbol.clone(),
            reason: reason.to_string(),
        };

        let position = state
            .positions
            .iter_mut()
            .find(|p| p.symbol == fill.symbol)
            .ok_or_else(|| TurtleError::UnknownMarket {
                symbol: fill.symbol.clone(),
            })?;

        if fill.quantity != 0 && !fill.average_price.is_finite() {
            return Err(mismatch("average price is not finite"));
        }

        let reported = Direction::from_stage(fill.quantity.signum() as i32);
        match (position.direction(), reported) {
            (None, None) => {}
            (None, Some(_)) => return Err(mismatch("quantity reported for a flat market")),
            (Some(_), None) => {
                warn!(symbol = %fill.symbol, "position reported flat by execution layer");
                position.close();
            }
            (Some(held), Some(dir)) if held != dir => {
                return Err(mismatch("reported direction disagrees with stage"));
            }
            (Some(_), Some(_)) => {
                position.quantity = fill.quantity;
                position.average_price = fill.average_price;
            }
        }
        position.pending_ticket = None;

        state.check_invariants(&self.config)?;
        Ok(state)
    }

    fn ensure_aligned(&self, state: &EngineState) -> Result<(), TurtleError> {
        let aligned = state.positions.len() == self.universe.count()
            && state
                .positions
                .iter()
                .zip(self.universe.symbols())
                .all(|(p, s)| p.symbol == s);
        if aligned {
            Ok(())
        } else {
            Err(TurtleError::InvariantViolation {
                symbol: "*".into(),
                reason: "state positions do not match universe order".into(),
            })
        }
    }

    /// Ticket `intent`, cancelling the market's stale unfilled intent first.
    fn emit(
        &self,
        next_ticket: &mut u64,
        position: &mut PositionState,
        intent: OrderIntent,
        out: &mut Vec<OrderIntent>,
    ) {
        if let Some(stale) = position.pending_ticket.take() {
            *next_ticket += 1;
            out.push(OrderIntent::cancel(&position.symbol, stale).with_ticket(*next_ticket));
        }
        *next_ticket += 1;
        if !self.config.simulate_fills {
            position.pending_ticket = Some(*next_ticket);
        }
        out.push(intent.with_ticket(*next_ticket));
    }
}
