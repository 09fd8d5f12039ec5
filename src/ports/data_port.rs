//! Historical market data port.

use crate::domain::bar::PriceBar;
use crate::domain::error::TurtleError;
use crate::domain::rollover::ContractSnapshot;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` within `[start_date, end_date]`, oldest first.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TurtleError>;

    /// Contract identity reported on each date, where the feed carries one.
    fn fetch_contracts(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, ContractSnapshot)>, TurtleError>;

    fn list_symbols(&self) -> Result<Vec<String>, TurtleError>;
}
