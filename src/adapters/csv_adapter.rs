//! CSV file data adapter.
//!
//! One file per market, `{SYMBOL}.csv`, with a header row:
//!
//! ```text
//! date,high,low,close,contract,auto_close_date
//! 2024-03-01,5150.25,5101.00,5137.50,ESH4,2024-03-14
//! ```
//!
//! The contract columns are optional. An empty price field is read as a
//! missing value, which makes any window containing that bar untradable.

use crate::domain::bar::PriceBar;
use crate::domain::error::TurtleError;
use crate::domain::rollover::ContractSnapshot;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    date: NaiveDate,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    contract: Option<String>,
    #[serde(default)]
    auto_close_date: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_rows(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BarRow>, TurtleError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TurtleError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in rdr.deserialize::<BarRow>() {
            let row = result.map_err(|e| TurtleError::Data {
                reason: format!("{}: {}", path.display(), e),
            })?;
            if row.date < start_date || row.date > end_date {
                continue;
            }
            rows.push(row);
        }

        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TurtleError> {
        let rows = self.read_rows(symbol, start_date, end_date)?;
        Ok(rows
            .iter()
            .map(|r| {
                PriceBar::new(
                    r.date,
                    r.high.unwrap_or(f64::NAN),
                    r.low.unwrap_or(f64::NAN),
                    r.close.unwrap_or(f64::NAN),
                )
            })
            .collect())
    }

    fn fetch_contracts(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, ContractSnapshot)>, TurtleError> {
        let rows = self.read_rows(symbol, start_date, end_date)?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let contract_id = r.contract.filter(|c| !c.is_empty())?;
                let auto_close_date = r.auto_close_date?;
                Some((
                    r.date,
                    ContractSnapshot {
                        contract_id,
                        auto_close_date,
                    },
                ))
            })
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TurtleError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TurtleError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TurtleError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let es = "date,high,low,close,contract,auto_close_date\n\
            2024-03-13,5120.0,5080.0,5100.0,ESH4,2024-03-14\n\
            2024-03-12,5110.0,5070.0,5090.0,ESH4,2024-03-14\n\
            2024-03-14,5130.0,5095.0,5125.0,ESM4,2024-06-13\n";
        fs::write(path.join("ES.csv"), es).unwrap();

        let cl = "date,high,low,close\n\
            2024-03-12,80.0,78.0,79.0\n\
            2024-03-13,,78.5,79.5\n";
        fs::write(path.join("CL.csv"), cl).unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_sorted_and_filtered() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("ES", date("2024-03-12"), date("2024-03-13"))
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date("2024-03-12"));
        assert_eq!(bars[1].high, 5120.0);
        assert_eq!(bars[1].close, 5100.0);
    }

    #[test]
    fn empty_price_reads_as_missing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let bars = adapter
            .fetch_bars("CL", NaiveDate::MIN, NaiveDate::MAX)
            .unwrap();
        assert!(bars[0].is_complete());
        assert!(bars[1].high.is_nan());
        assert!(!bars[1].is_complete());
    }

    #[test]
    fn contracts_read_when_present() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let contracts = adapter
            .fetch_contracts("ES", NaiveDate::MIN, NaiveDate::MAX)
            .unwrap();
        assert_eq!(contracts.len(), 3);
        assert_eq!(contracts[2].1.contract_id, "ESM4");
        assert_eq!(contracts[2].1.auto_close_date, date("2024-06-13"));

        let none = adapter
            .fetch_contracts("CL", NaiveDate::MIN, NaiveDate::MAX)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn missing_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter
            .fetch_bars("GC", NaiveDate::MIN, NaiveDate::MAX)
            .unwrap_err();
        assert!(matches!(err, TurtleError::Data { .. }));
    }

    #[test]
    fn malformed_price_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("GC.csv"),
            "date,high,low,close\n2024-01-02,abc,1.0,1.0\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter
            .fetch_bars("GC", NaiveDate::MIN, NaiveDate::MAX)
            .is_err());
    }

    #[test]
    fn list_symbols_from_file_names() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["CL", "ES"]);
    }
}
