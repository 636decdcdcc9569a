//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss: an exponentially weighted
//! mean with alpha = 1/n, seeded with the first price change and without bias
//! correction.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! The first bar has no price change and is undefined. With `warmup` set, the
//! first n bars are undefined instead.

use crate::domain::error::StocktaError;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::indicator_helpers::ewm;
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_BUY_THRESHOLD: f64 = 30.0;
pub const DEFAULT_SELL_THRESHOLD: f64 = 70.0;

pub const LINE: &str = "rsi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiParams {
    pub period: usize,
    pub warmup: bool,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            warmup: false,
        }
    }
}

impl RsiParams {
    pub fn validate(&self) -> Result<(), StocktaError> {
        require_positive("RSI", "period", self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            buy: DEFAULT_BUY_THRESHOLD,
            sell: DEFAULT_SELL_THRESHOLD,
        }
    }
}

impl RsiThresholds {
    pub fn validate(&self) -> Result<(), StocktaError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.buy) || !in_range(self.sell) || self.buy >= self.sell {
            return Err(StocktaError::configuration(
                "RSI",
                format!(
                    "thresholds must satisfy 0 <= buy ({}) < sell ({}) <= 100",
                    self.buy, self.sell
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiSignal {
    Buy,
    Sell,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalSummary {
    pub buys: usize,
    pub sells: usize,
}

impl SignalSummary {
    pub fn from_signals(signals: &[RsiSignal]) -> Self {
        signals.iter().fold(Self::default(), |mut acc, s| {
            match s {
                RsiSignal::Buy => acc.buys += 1,
                RsiSignal::Sell => acc.sells += 1,
                RsiSignal::Neutral => {}
            }
            acc
        })
    }
}

pub fn calculate_rsi(
    series: &PriceSeries,
    params: &RsiParams,
) -> Result<IndicatorResult, StocktaError> {
    params.validate()?;

    let closes = series.closes();
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
        } else {
            let change = closes[i] - closes[i - 1];
            gains.push(Some(change.max(0.0)));
            losses.push(Some((-change).max(0.0)));
        }
    }

    let alpha = 1.0 / params.period as f64;
    let avg_gain = ewm(&gains, alpha);
    let avg_loss = ewm(&losses, alpha);

    let values: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .enumerate()
        .map(|(i, pair)| match pair {
            _ if params.warmup && i < params.period => None,
            (Some(gain), Some(loss)) => Some(rsi_value(*gain, *loss)),
            _ => None,
        })
        .collect();

    Ok(IndicatorResult::new(IndicatorType::Rsi(params.period), series.dates())
        .with_line(LINE, values))
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Map each RSI value to a trade signal. Undefined positions are `Neutral`.
pub fn classify_rsi(rsi: &[Option<f64>], thresholds: &RsiThresholds) -> Vec<RsiSignal> {
    rsi.iter()
        .map(|v| match v {
            Some(v) if *v < thresholds.buy => RsiSignal::Buy,
            Some(v) if *v > thresholds.sell => RsiSignal::Sell,
            _ => RsiSignal::Neutral,
        })
        .collect()
}
