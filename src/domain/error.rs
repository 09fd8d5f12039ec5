//! Domain error types.

/// Top-level error type for turtlecore.
#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown market symbol: {symbol}")]
    UnknownMarket { symbol: String },

    #[error("duplicate market symbol: {symbol}")]
    DuplicateMarket { symbol: String },

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("fill report for {symbol} rejected: {reason}")]
    FillMismatch { symbol: String, reason: String },

    #[error("invariant violated for {symbol}: {reason}")]
    InvariantViolation { symbol: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TurtleError> for std::process::ExitCode {
    fn from(err: &TurtleError) -> Self {
        let code: u8 = match err {
            TurtleError::Io(_) | TurtleError::Json(_) => 1,
            TurtleError::ConfigParse { .. }
            | TurtleError::ConfigMissing { .. }
            | TurtleError::ConfigInvalid { .. } => 2,
            TurtleError::UnknownMarket { .. }
            | TurtleError::DuplicateMarket { .. }
            | TurtleError::EmptyUniverse => 3,
            TurtleError::Data { .. } => 5,
            TurtleError::FillMismatch { .. } | TurtleError::InvariantViolation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = TurtleError::ConfigInvalid {
            section: "turtle".into(),
            key: "atr_period".into(),
            reason: "must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [turtle] atr_period: must be at least 1"
        );
    }

    #[test]
    fn unknown_market_display() {
        let err = TurtleError::UnknownMarket {
            symbol: "ZZ".into(),
        };
        assert_eq!(err.to_string(), "unknown market symbol: ZZ");
    }
}
