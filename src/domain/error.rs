//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stockta.
#[derive(Debug, thiserror::Error)]
pub enum StocktaError {
    #[error("invalid {indicator} configuration: {reason}")]
    Configuration { indicator: String, reason: String },

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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("bars for {symbol} are not strictly ascending at {date}")]
    UnorderedSeries { symbol: String, date: NaiveDate },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StocktaError {
    pub fn configuration(indicator: &str, reason: impl Into<String>) -> Self {
        StocktaError::Configuration {
            indicator: indicator.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&StocktaError> for std::process::ExitCode {
    fn from(err: &StocktaError) -> Self {
        let code: u8 = match err {
            StocktaError::Io(_) | StocktaError::Render { .. } => 1,
            StocktaError::ConfigParse { .. }
            | StocktaError::ConfigMissing { .. }
            | StocktaError::ConfigInvalid { .. }
            | StocktaError::Configuration { .. } => 2,
            StocktaError::DataSource { .. } | StocktaError::UnorderedSeries { .. } => 3,
            StocktaError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
