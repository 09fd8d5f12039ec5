//! Fixed-length, most-recent-last bar window per market.
//!
//! The last bar is the in-progress session and is never read by the
//! indicator calculations; [`PriceWindow::completed`] exposes every bar
//! before it.

use crate::domain::bar::PriceBar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWindow {
    bars: Vec<PriceBar>,
}

impl PriceWindow {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    /// Keep only the trailing `len` bars of `bars`.
    pub fn trailing(bars: &[PriceBar], len: usize) -> Self {
        let start = bars.len().saturating_sub(len);
        Self {
            bars: bars[start..].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Every bar strictly before the in-progress one.
    pub fn completed(&self) -> &[PriceBar] {
        match self.bars.len() {
            0 => &[],
            n => &self.bars[..n - 1],
        }
    }

    pub fn current(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// True when every bar is finite.
    pub fn is_complete(&self) -> bool {
        self.bars.iter().all(PriceBar::is_complete)
    }
}
