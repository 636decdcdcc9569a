//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No bias correction and no warmup: every position is defined.

use crate::domain::error::StocktaError;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::indicator_helpers::{defined, ewm};
use crate::domain::ohlcv::PriceSeries;

pub const LINE: &str = "ema";

/// Smoothing factor for a span of `period` bars.
pub fn span_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

pub fn calculate_ema(series: &PriceSeries, period: usize) -> Result<IndicatorResult, StocktaError> {
    require_positive("EMA", "period", period)?;

    let values = ewm(&defined(&series.closes()), span_alpha(period));
    Ok(IndicatorResult::new(IndicatorType::Ema(period), series.dates()).with_line(LINE, values))
}
