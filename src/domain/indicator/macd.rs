//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Every EMA is seeded with its first input, so all three lines are defined
//! from the first bar.

use tracing::debug;

use crate::domain::error::StocktaError;
use crate::domain::indicator::ema::span_alpha;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::indicator_helpers::{defined, ewm, zip_with};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub const LINE: &str = "macd";
pub const SIGNAL: &str = "signal";
pub const HISTOGRAM: &str = "histogram";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), StocktaError> {
        require_positive("MACD", "fast period", self.fast)?;
        require_positive("MACD", "slow period", self.slow)?;
        require_positive("MACD", "signal period", self.signal)?;
        if self.fast >= self.slow {
            return Err(StocktaError::configuration(
                "MACD",
                format!(
                    "fast period ({}) must be below slow period ({})",
                    self.fast, self.slow
                ),
            ));
        }
        Ok(())
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }
}

pub fn calculate_macd(
    series: &PriceSeries,
    params: &MacdParams,
) -> Result<IndicatorResult, StocktaError> {
    params.validate()?;
    debug!(bars = series.len(), symbol = %series.symbol(), "computing {}", params.indicator_type());

    let closes = defined(&series.closes());
    let ema_fast = ewm(&closes, span_alpha(params.fast));
    let ema_slow = ewm(&closes, span_alpha(params.slow));

    let macd_line = zip_with(&ema_fast, &ema_slow, |f, s| f - s);
    let signal_line = ewm(&macd_line, span_alpha(params.signal));
    let histogram = zip_with(&macd_line, &signal_line, |m, s| m - s);

    Ok(IndicatorResult::new(params.indicator_type(), series.dates())
        .with_line(LINE, macd_line)
        .with_line(SIGNAL, signal_line)
        .with_line(HISTOGRAM, histogram))
}
