//! Consumer of emitted order intents.

use crate::domain::error::TurtleError;
use crate::domain::order::OrderIntent;
use chrono::NaiveDate;

pub trait IntentSink {
    fn record(&mut self, date: NaiveDate, intents: &[OrderIntent]) -> Result<(), TurtleError>;

    fn flush(&mut self) -> Result<(), TurtleError> {
        Ok(())
    }
}
