//! Ichimoku Cloud indicator.
//!
//! - Tenkan-sen (conversion): midpoint of the 9-bar high/low range
//! - Kijun-sen (base): midpoint of the 26-bar high/low range
//! - Senkou Span A: (tenkan + kijun) / 2, displaced 26 bars forward
//! - Senkou Span B: midpoint of the 52-bar high/low range, displaced 26 bars forward
//! - Chikou Span: close displaced 26 bars backward
//!
//! Rolling ranges are undefined until their window is full. Forward
//! displacement leaves the first 26 positions undefined and drops the last 26
//! raw values; backward displacement leaves the last 26 positions undefined.

use crate::domain::error::StocktaError;
use crate::domain::indicator::{require_positive, IndicatorResult, IndicatorType};
use crate::domain::indicator_helpers::{defined, rolling_max, rolling_min, shift, zip_with};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_CONVERSION: usize = 9;
pub const DEFAULT_BASE: usize = 26;
pub const DEFAULT_SPAN_B: usize = 52;
pub const DEFAULT_DISPLACEMENT: usize = 26;

pub const TENKAN: &str = "tenkan_sen";
pub const KIJUN: &str = "kijun_sen";
pub const SENKOU_A: &str = "senkou_span_a";
pub const SENKOU_B: &str = "senkou_span_b";
pub const CHIKOU: &str = "chikou_span";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IchimokuParams {
    pub conversion: usize,
    pub base: usize,
    pub span_b: usize,
    pub displacement: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            conversion: DEFAULT_CONVERSION,
            base: DEFAULT_BASE,
            span_b: DEFAULT_SPAN_B,
            displacement: DEFAULT_DISPLACEMENT,
        }
    }
}

impl IchimokuParams {
    pub fn validate(&self) -> Result<(), StocktaError> {
        require_positive("Ichimoku", "conversion period", self.conversion)?;
        require_positive("Ichimoku", "base period", self.base)?;
        require_positive("Ichimoku", "span B period", self.span_b)?;
        require_positive("Ichimoku", "displacement", self.displacement)?;
        self.signed_displacement()?;
        Ok(())
    }

    fn signed_displacement(&self) -> Result<isize, StocktaError> {
        isize::try_from(self.displacement).map_err(|_| {
            StocktaError::configuration(
                "Ichimoku",
                format!("displacement {} is too large", self.displacement),
            )
        })
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Ichimoku {
            conversion: self.conversion,
            base: self.base,
            span_b: self.span_b,
            displacement: self.displacement,
        }
    }
}

/// Which way the cloud leans at a given bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudBias {
    Bullish,
    Bearish,
}

pub fn calculate_ichimoku(
    series: &PriceSeries,
    params: &IchimokuParams,
) -> Result<IndicatorResult, StocktaError> {
    params.validate()?;

    let highs = series.highs();
    let lows = series.lows();
    let displacement = params.signed_displacement()?;

    let tenkan = midpoint(&highs, &lows, params.conversion);
    let kijun = midpoint(&highs, &lows, params.base);

    let raw_a = zip_with(&tenkan, &kijun, |t, k| (t + k) / 2.0);
    let senkou_a = shift(&raw_a, displacement);
    let senkou_b = shift(&midpoint(&highs, &lows, params.span_b), displacement);
    let chikou = shift(&defined(&series.closes()), -displacement);

    Ok(IndicatorResult::new(params.indicator_type(), series.dates())
        .with_line(TENKAN, tenkan)
        .with_line(KIJUN, kijun)
        .with_line(SENKOU_A, senkou_a)
        .with_line(SENKOU_B, senkou_b)
        .with_line(CHIKOU, chikou))
}

fn midpoint(highs: &[f64], lows: &[f64], window: usize) -> Vec<Option<f64>> {
    zip_with(&rolling_max(highs, window), &rolling_min(lows, window), |h, l| {
        (h + l) / 2.0
    })
}

/// Classify each bar by comparing span A with span B.
///
/// `Bullish` where A >= B, `Bearish` where A < B, and no classification where
/// either span is undefined.
pub fn classify_cloud(span_a: &[Option<f64>], span_b: &[Option<f64>]) -> Vec<Option<CloudBias>> {
    span_a
        .iter()
        .zip(span_b)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a >= b => Some(CloudBias::Bullish),
            (Some(_), Some(_)) => Some(CloudBias::Bearish),
            _ => None,
        })
        .collect()
}
