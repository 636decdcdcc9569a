//! Technical indicator implementations.
//!
//! This module provides the types shared by every indicator:
//! - `IndicatorType`: indicator identity + parameters (usable as a HashMap key)
//! - `IndicatorLine`: one named output sequence, `None` marking undefined positions
//! - `IndicatorResult`: all lines of one computation, aligned with the input series
//!
//! Every line of a result has exactly as many entries as the input series.

pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use bollinger::{calculate_bollinger, BollingerMode, BollingerParams};
pub use ema::calculate_ema;
pub use ichimoku::{calculate_ichimoku, classify_cloud, CloudBias, IchimokuParams};
pub use macd::{calculate_macd, MacdParams};
pub use rsi::{calculate_rsi, classify_rsi, RsiParams, RsiSignal, RsiThresholds, SignalSummary};
pub use stochastic::{calculate_stochastic, StochasticLevels, StochasticParams};

use crate::domain::error::StocktaError;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        window: usize,
        stddev_mult_x100: u32,
        mode: BollingerMode,
    },
    Ichimoku {
        conversion: usize,
        base: usize,
        span_b: usize,
        displacement: usize,
    },
    Stochastic {
        window: usize,
        smooth_k: usize,
        smooth_d: usize,
    },
    Rsi(usize),
}

impl IndicatorType {
    /// Overlays share the price axis; the rest are drawn in their own panel.
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            IndicatorType::Ema(_) | IndicatorType::Bollinger { .. } | IndicatorType::Ichimoku { .. }
        )
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                window,
                stddev_mult_x100,
                mode,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{},{})", window, mult, mode)
            }
            IndicatorType::Ichimoku {
                conversion,
                base,
                span_b,
                displacement,
            } => write!(
                f,
                "ICHIMOKU({},{},{},{})",
                conversion, base, span_b, displacement
            ),
            IndicatorType::Stochastic {
                window,
                smooth_k,
                smooth_d,
            } => write!(f, "STOCHASTIC({},{},{})", window, smooth_k, smooth_d),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorLine {
    pub name: &'static str,
    pub values: Vec<Option<f64>>,
}

impl IndicatorLine {
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorResult {
    pub indicator_type: IndicatorType,
    pub dates: Vec<NaiveDate>,
    pub lines: Vec<IndicatorLine>,
}

impl IndicatorResult {
    pub fn new(indicator_type: IndicatorType, dates: Vec<NaiveDate>) -> Self {
        Self {
            indicator_type,
            dates,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, name: &'static str, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), self.dates.len(), "line {name} is misaligned");
        self.lines.push(IndicatorLine { name, values });
        self
    }

    pub fn line(&self, name: &str) -> Option<&[Option<f64>]> {
        self.lines
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Most recent defined value of a line, with its date.
    pub fn latest(&self, name: &str) -> Option<(NaiveDate, f64)> {
        let values = self.line(name)?;
        self.dates
            .iter()
            .zip(values)
            .rev()
            .find_map(|(date, v)| v.map(|v| (*date, v)))
    }
}

pub(crate) fn require_positive(
    indicator: &str,
    name: &str,
    value: usize,
) -> Result<(), StocktaError> {
    if value == 0 {
        return Err(StocktaError::configuration(
            indicator,
            format!("{name} must be positive"),
        ));
    }
    Ok(())
}
