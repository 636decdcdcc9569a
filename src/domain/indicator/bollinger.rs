//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: mean of the closes in the window
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Two window modes are supported:
//! - `Expanding`: closes from max(0, i - window) through i, i.e. up to
//!   window + 1 samples, shorter at the start. Population standard deviation.
//!   Defined from the first bar.
//! - `Trailing`: exactly `window` closes ending at i, sample standard deviation
//!   (divides by N - 1). First (window - 1) bars are undefined.
//!
//! Default parameters: window=20, multiplier=2.0, mode=Trailing

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StocktaError;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD_DEV: f64 = 2.0;

pub const MIDDLE: &str = "middle";
pub const UPPER: &str = "upper";
pub const LOWER: &str = "lower";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BollingerMode {
    Expanding,
    #[default]
    Trailing,
}

impl fmt::Display for BollingerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BollingerMode::Expanding => write!(f, "expanding"),
            BollingerMode::Trailing => write!(f, "trailing"),
        }
    }
}

impl FromStr for BollingerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expanding" => Ok(BollingerMode::Expanding),
            "trailing" => Ok(BollingerMode::Trailing),
            other => Err(format!(
                "unknown bollinger mode '{other}', expected 'expanding' or 'trailing'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub window: usize,
    pub num_std_dev: f64,
    pub mode: BollingerMode,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            num_std_dev: DEFAULT_NUM_STD_DEV,
            mode: BollingerMode::default(),
        }
    }
}

impl BollingerParams {
    pub fn validate(&self) -> Result<(), StocktaError> {
        require_positive("Bollinger", "window", self.window)?;
        if !self.num_std_dev.is_finite() || self.num_std_dev <= 0.0 {
            return Err(StocktaError::configuration(
                "Bollinger",
                "standard deviation multiplier must be a positive number",
            ));
        }
        if self.mode == BollingerMode::Trailing && self.window < 2 {
            return Err(StocktaError::configuration(
                "Bollinger",
                "trailing mode needs a window of at least 2 for sample standard deviation",
            ));
        }
        Ok(())
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            window: self.window,
            stddev_mult_x100: (self.num_std_dev * 100.0).round() as u32,
            mode: self.mode,
        }
    }
}

pub fn calculate_bollinger(
    series: &PriceSeries,
    params: &BollingerParams,
) -> Result<IndicatorResult, StocktaError> {
    params.validate()?;

    let closes = series.closes();
    let mut middle = Vec::with_capacity(closes.len());
    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let band = match params.mode {
            BollingerMode::Expanding => {
                let start = i.saturating_sub(params.window);
                Some(mean_and_stddev(&closes[start..=i], 0))
            }
            BollingerMode::Trailing if i + 1 >= params.window => {
                let start = i + 1 - params.window;
                Some(mean_and_stddev(&closes[start..=i], 1))
            }
            BollingerMode::Trailing => None,
        };

        match band {
            Some((mean, stddev)) => {
                middle.push(Some(mean));
                upper.push(Some(mean + params.num_std_dev * stddev));
                lower.push(Some(mean - params.num_std_dev * stddev));
            }
            None => {
                middle.push(None);
                upper.push(None);
                lower.push(None);
            }
        }
    }

    Ok(IndicatorResult::new(params.indicator_type(), series.dates())
        .with_line(MIDDLE, middle)
        .with_line(UPPER, upper)
        .with_line(LOWER, lower))
}

/// Mean and standard deviation with `ddof` delta degrees of freedom
/// (0 = population, 1 = sample).
fn mean_and_stddev(window: &[f64], ddof: usize) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let sum_sq: f64 = window
        .iter()
        .map(|c| {
            let diff = c - mean;
            diff * diff
        })
        .sum();
    let variance = sum_sq / (n - ddof as f64);
    (mean, variance.sqrt())
}
