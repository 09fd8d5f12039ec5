//! Intent journal written as CSV.

use crate::domain::error::TurtleError;
use crate::domain::order::OrderIntent;
use crate::ports::intent_sink::IntentSink;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct IntentRow<'a> {
    date: NaiveDate,
    ticket: u64,
    symbol: &'a str,
    action: String,
    direction: i32,
    quantity: i64,
    price: f64,
    kind: String,
    cancels: Option<u64>,
    from_contract: Option<&'a str>,
    to_contract: Option<&'a str>,
}

pub struct CsvIntentWriter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl CsvIntentWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TurtleError> {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvIntentWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> Result<W, TurtleError> {
        self.writer.into_inner().map_err(|e| TurtleError::Io(e.into_error()))
    }
}

fn csv_error(e: csv::Error) -> TurtleError {
    TurtleError::Io(std::io::Error::other(e))
}

impl<W: Write> IntentSink for CsvIntentWriter<W> {
    fn record(&mut self, date: NaiveDate, intents: &[OrderIntent]) -> Result<(), TurtleError> {
        for intent in intents {
            let row = IntentRow {
                date,
                ticket: intent.ticket,
                symbol: &intent.symbol,
                action: intent.action.to_string(),
                direction: intent.direction,
                quantity: intent.quantity,
                price: intent.price,
                kind: intent.kind.to_string(),
                cancels: intent.cancels,
                from_contract: intent.from_contract.as_deref(),
                to_contract: intent.to_contract.as_deref(),
            };
            self.writer.serialize(row).map_err(csv_error)?;
            self.written += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TurtleError> {
        self.writer.flush()?;
        Ok(())
    }
}
