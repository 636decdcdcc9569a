//! Presentation port trait for indicator output.

use std::path::Path;

use crate::domain::error::StocktaError;
use crate::domain::indicator::{IndicatorResult, RsiSignal};
use crate::domain::ohlcv::PriceSeries;

/// A horizontal guide line, e.g. RSI buy/sell thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLevel {
    pub label: String,
    pub value: f64,
}

impl ReferenceLevel {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Port for rendering a computed indicator next to its price series.
///
/// Each call writes a fresh output; implementations keep no state between calls.
/// `signals` holds one entry per bar for RSI and is empty otherwise.
pub trait ChartPort {
    fn render(
        &self,
        series: &PriceSeries,
        result: &IndicatorResult,
        levels: &[ReferenceLevel],
        signals: &[RsiSignal],
        output_path: &Path,
    ) -> Result<(), StocktaError>;
}
