//! Breakout levels and ATR for one market.
//!
//! Every value is computed from the completed bars of a [`PriceWindow`].
//! An N-bar level over a window of length L reads bars `[L-N-1, L-1)`.
//!
//! ATR uses Wilder's smoothing:
//! - Seed: simple mean of the first `period` true ranges
//! - Subsequent: atr = (prev_atr * (period-1) + tr) / period
//!
//! True range needs the previous close, so `period + 1` completed bars
//! are the minimum.

use crate::domain::bar::PriceBar;
use crate::domain::config::TurtleConfig;
use crate::domain::position::{Direction, StrategyVariant};
use crate::domain::price_window::PriceWindow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub strat1_breakout_high: f64,
    pub strat1_breakout_low: f64,
    pub strat2_breakout_high: f64,
    pub strat2_breakout_low: f64,
    pub strat1_exit_high: f64,
    pub strat1_exit_low: f64,
    pub strat2_exit_high: f64,
    pub strat2_exit_low: f64,
    /// One unit of daily volatility ("N").
    pub atr: f64,
}

impl Indicators {
    /// Entry threshold for `variant` in `direction`.
    pub fn breakout_level(&self, variant: StrategyVariant, direction: Direction) -> f64 {
        match (variant, direction) {
            (StrategyVariant::Strat1, Direction::Long) => self.strat1_breakout_high,
            (StrategyVariant::Strat1, Direction::Short) => self.strat1_breakout_low,
            (StrategyVariant::Strat2, Direction::Long) => self.strat2_breakout_high,
            (StrategyVariant::Strat2, Direction::Short) => self.strat2_breakout_low,
        }
    }

    /// Threshold that closes a position held in `direction` under `variant`.
    pub fn exit_level(&self, variant: StrategyVariant, direction: Direction) -> f64 {
        match (variant, direction) {
            (StrategyVariant::Strat1, Direction::Long) => self.strat1_exit_low,
            (StrategyVariant::Strat1, Direction::Short) => self.strat1_exit_high,
            (StrategyVariant::Strat2, Direction::Long) => self.strat2_exit_low,
            (StrategyVariant::Strat2, Direction::Short) => self.strat2_exit_high,
        }
    }

    pub fn has_usable_atr(&self) -> bool {
        self.atr.is_finite() && self.atr > 0.0
    }
}

/// Why a market was excluded from the current cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Untradable {
    MissingData,
    InsufficientBars { bars: usize, required: usize },
}

pub fn compute_indicators(
    window: &PriceWindow,
    config: &TurtleConfig,
) -> Result<Indicators, Untradable> {
    let required = config.min_window_len();
    if window.len() < required {
        return Err(Untradable::InsufficientBars {
            bars: window.len(),
            required,
        });
    }
    if !window.is_complete() {
        return Err(Untradable::MissingData);
    }

    let done = window.completed();
    Ok(Indicators {
        strat1_breakout_high: highest_high(done, config.strat1_breakout),
        strat1_breakout_low: lowest_low(done, config.strat1_breakout),
        strat2_breakout_high: highest_high(done, config.strat2_breakout),
        strat2_breakout_low: lowest_low(done, config.strat2_breakout),
        strat1_exit_high: highest_high(done, config.strat1_exit),
        strat1_exit_low: lowest_low(done, config.strat1_exit),
        strat2_exit_high: highest_high(done, config.strat2_exit),
        strat2_exit_low: lowest_low(done, config.strat2_exit),
        atr: wilder_atr(done, config.atr_period),
    })
}

fn tail(bars: &[PriceBar], n: usize) -> &[PriceBar] {
    &bars[bars.len().saturating_sub(n)..]
}

/// Highest high of the trailing `n` bars; NaN when `bars` is empty.
pub fn highest_high(bars: &[PriceBar], n: usize) -> f64 {
    tail(bars, n)
        .iter()
        .map(|b| b.high)
        .fold(f64::NAN, f64::max)
}

/// Lowest low of the trailing `n` bars; NaN when `bars` is empty.
pub fn lowest_low(bars: &[PriceBar], n: usize) -> f64 {
    tail(bars, n).iter().map(|b| b.low).fold(f64::NAN, f64::min)
}

/// Wilder ATR over all of `bars`. Returns 0.0 when fewer than `period + 1`
/// bars are available.
pub fn wilder_atr(bars: &[PriceBar], period: usize) -> f64 {
    if period == 0 || bars.len() < period + 1 {
        return 0.0;
    }

    let tr: Vec<f64> = bars
        .windows(2)
        .map(|pair| pair[1].true_range(pair[0].close))
        .collect();

    let seed = tr[..period].iter().sum::<f64>() / period as f64;
    tr[period..]
        .iter()
        .fold(seed, |atr, &t| (atr * (period - 1) as f64 + t) / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: usize, high: f64, low: f64, close: f64) -> PriceBar {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceBar::new(start + chrono::Duration::days(i as i64), high, low, close)
    }

    fn flat_bars(n: usize, high: f64, low: f64) -> Vec<PriceBar> {
        (0..n).map(|i| bar(i, high, low, (high + low) / 2.0)).collect()
    }

    #[test]
    fn atr_seed_is_mean_of_true_ranges() {
        let bars = vec![
            bar(0, 110.0, 100.0, 105.0),
            bar(1, 115.0, 105.0, 110.0),
            bar(2, 120.0, 110.0, 115.0),
            bar(3, 125.0, 115.0, 120.0),
        ];
        // TRs: 10, 10, 10
        assert!((wilder_atr(&bars, 3) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            bar(0, 110.0, 100.0, 105.0),
            bar(1, 115.0, 105.0, 110.0),
            bar(2, 120.0, 110.0, 115.0),
            bar(3, 140.0, 120.0, 130.0),
        ];
        // TRs: 10, 10, 25 → seed (period 2) = 10, then (10 + 25) / 2
        assert!((wilder_atr(&bars, 2) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars_is_zero() {
        let bars = flat_bars(3, 110.0, 90.0);
        assert_eq!(wilder_atr(&bars, 3), 0.0);
    }

    #[test]
    fn breakout_uses_only_completed_bars() {
        let config = TurtleConfig::default();
        let mut bars = flat_bars(56, 100.0, 90.0);
        // In-progress bar spikes: must not move the breakout levels.
        bars[55].high = 500.0;
        bars[55].low = 1.0;
        // Bar just outside the 20-bar window (index 34) is ignored by strat1.
        bars[34].high = 300.0;
        // Bar inside the window (index 35) is included.
        bars[35].high = 120.0;

        let ind = compute_indicators(&PriceWindow::new(bars), &config).unwrap();
        assert!((ind.strat1_breakout_high - 120.0).abs() < f64::EPSILON);
        assert!((ind.strat2_breakout_high - 300.0).abs() < f64::EPSILON);
        assert!((ind.strat1_breakout_low - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exit_levels_use_their_own_windows() {
        let config = TurtleConfig::default();
        let mut bars = flat_bars(56, 100.0, 90.0);
        bars[44].low = 80.0; // outside last 10 completed bars, inside last 20
        bars[50].low = 85.0; // inside last 10

        let ind = compute_indicators(&PriceWindow::new(bars), &config).unwrap();
        assert!((ind.strat1_exit_low - 85.0).abs() < f64::EPSILON);
        assert!((ind.strat2_exit_low - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_window_is_untradable() {
        let config = TurtleConfig::default();
        let err = compute_indicators(&PriceWindow::new(flat_bars(30, 100.0, 90.0)), &config)
            .unwrap_err();
        assert_eq!(
            err,
            Untradable::InsufficientBars {
                bars: 30,
                required: 56
            }
        );
    }

    #[test]
    fn nan_bar_is_untradable() {
        let config = TurtleConfig::default();
        let mut bars = flat_bars(56, 100.0, 90.0);
        bars[10].high = f64::NAN;
        let err = compute_indicators(&PriceWindow::new(bars), &config).unwrap_err();
        assert_eq!(err, Untradable::MissingData);
    }

    #[test]
    fn constant_range_gives_constant_atr() {
        let config = TurtleConfig::default();
        let ind =
            compute_indicators(&PriceWindow::new(flat_bars(56, 100.0, 90.0)), &config).unwrap();
        assert!((ind.atr - 10.0).abs() < 1e-9);
        assert!(ind.has_usable_atr());
    }

    #[test]
    fn zero_range_gives_unusable_atr() {
        let config = TurtleConfig::default();
        let ind =
            compute_indicators(&PriceWindow::new(flat_bars(56, 100.0, 100.0)), &config).unwrap();
        assert!(!ind.has_usable_atr());
    }

    #[test]
    fn level_lookup_by_variant_and_direction() {
        let ind = Indicators {
            strat1_breakout_high: 1.0,
            strat1_breakout_low: 2.0,
            strat2_breakout_high: 3.0,
            strat2_breakout_low: 4.0,
            strat1_exit_high: 5.0,
            strat1_exit_low: 6.0,
            strat2_exit_high: 7.0,
            strat2_exit_low: 8.0,
            atr: 1.0,
        };
        assert_eq!(ind.breakout_level(StrategyVariant::Strat2, Direction::Short), 4.0);
        assert_eq!(ind.exit_level(StrategyVariant::Strat1, Direction::Long), 6.0);
        assert_eq!(ind.exit_level(StrategyVariant::Strat2, Direction::Short), 7.0);
    }
}
