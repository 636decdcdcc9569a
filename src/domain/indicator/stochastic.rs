//! Stochastic Oscillator indicator.
//!
//! Raw %K = 100 * (C - LowestLow(n)) / (HighestHigh(n) - LowestLow(n))
//! %K = SMA(raw %K, smooth_k)
//! %D = SMA(%K, smooth_d)
//!
//! Default parameters: window=14, smooth_k=3, smooth_d=3
//! Warmup: %K is undefined for the first (window + smooth_k - 2) bars, %D for
//! a further (smooth_d - 1).
//! A flat window (highest high == lowest low) yields `FLAT_RANGE_K`.

use crate::domain::error::StocktaError;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::indicator_helpers::{rolling_max, rolling_min, rolling_mean};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_WINDOW: usize = 14;
pub const DEFAULT_SMOOTH_K: usize = 3;
pub const DEFAULT_SMOOTH_D: usize = 3;

pub const OVERBOUGHT: f64 = 80.0;
pub const OVERSOLD: f64 = 20.0;

/// Raw %K when the window has no range.
pub const FLAT_RANGE_K: f64 = 50.0;

pub const K: &str = "k";
pub const D: &str = "d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticParams {
    pub window: usize,
    pub smooth_k: usize,
    pub smooth_d: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            smooth_k: DEFAULT_SMOOTH_K,
            smooth_d: DEFAULT_SMOOTH_D,
        }
    }
}

impl StochasticParams {
    pub fn validate(&self) -> Result<(), StocktaError> {
        require_positive("Stochastic", "window", self.window)?;
        require_positive("Stochastic", "%K smoothing", self.smooth_k)?;
        require_positive("Stochastic", "%D smoothing", self.smooth_d)?;
        Ok(())
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Stochastic {
            window: self.window,
            smooth_k: self.smooth_k,
            smooth_d: self.smooth_d,
        }
    }
}

/// Reference levels drawn by consumers; not used by the calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticLevels {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for StochasticLevels {
    fn default() -> Self {
        Self {
            overbought: OVERBOUGHT,
            oversold: OVERSOLD,
        }
    }
}

impl StochasticLevels {
    pub fn validate(&self) -> Result<(), StocktaError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.oversold) || !in_range(self.overbought) || self.oversold >= self.overbought {
            return Err(StocktaError::configuration(
                "Stochastic",
                format!(
                    "levels must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                    self.oversold, self.overbought
                ),
            ));
        }
        Ok(())
    }
}

pub fn calculate_stochastic(
    series: &PriceSeries,
    params: &StochasticParams,
) -> Result<IndicatorResult, StocktaError> {
    params.validate()?;

    let closes = series.closes();
    let low_min = rolling_min(&series.lows(), params.window);
    let high_max = rolling_max(&series.highs(), params.window);

    let raw_k: Vec<Option<f64>> = closes
        .iter()
        .zip(low_min.iter().zip(&high_max))
        .map(|(close, range)| match range {
            (Some(low), Some(high)) => Some(raw_percent_k(*close, *low, *high)),
            _ => None,
        })
        .collect();

    let k = rolling_mean(&raw_k, params.smooth_k);
    let d = rolling_mean(&k, params.smooth_d);

    Ok(IndicatorResult::new(params.indicator_type(), series.dates())
        .with_line(K, k)
        .with_line(D, d))
}

fn raw_percent_k(close: f64, low: f64, high: f64) -> f64 {
    let range = high - low;
    if range == 0.0 {
        FLAT_RANGE_K
    } else {
        100.0 * (close - low) / range
    }
}
