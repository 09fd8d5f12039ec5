//! Daily price bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            high,
            low,
            close,
        }
    }

    /// False when any field is NaN or infinite.
    pub fn is_complete(&self) -> bool {
        self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}
