//! CSV export adapter implementing ChartPort.
//!
//! Writes one row per bar: `date,close,<line>...`. Undefined values are left
//! as empty cells. Ichimoku exports gain a `cloud` column, and RSI exports a
//! `signal` column (`buy`, `sell` or empty).

use std::path::Path;

use tracing::info;

use crate::domain::error::StocktaError;
use crate::domain::indicator::ichimoku::{SENKOU_A, SENKOU_B};
use crate::domain::indicator::{
    classify_cloud, CloudBias, IndicatorResult, IndicatorType, RsiSignal,
};
use crate::domain::ohlcv::PriceSeries;
use crate::ports::chart_port::{ChartPort, ReferenceLevel};

#[derive(Debug, Default)]
pub struct CsvExportAdapter;

impl CsvExportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(e: csv::Error) -> StocktaError {
    StocktaError::Render {
        reason: format!("CSV write error: {}", e),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn cloud_column(result: &IndicatorResult) -> Option<Vec<Option<CloudBias>>> {
    if !matches!(result.indicator_type, IndicatorType::Ichimoku { .. }) {
        return None;
    }
    let span_a = result.line(SENKOU_A)?;
    let span_b = result.line(SENKOU_B)?;
    Some(classify_cloud(span_a, span_b))
}

fn signal_label(signal: RsiSignal) -> &'static str {
    match signal {
        RsiSignal::Buy => "buy",
        RsiSignal::Sell => "sell",
        RsiSignal::Neutral => "",
    }
}

impl ChartPort for CsvExportAdapter {
    fn render(
        &self,
        series: &PriceSeries,
        result: &IndicatorResult,
        _levels: &[ReferenceLevel],
        signals: &[RsiSignal],
        output_path: &Path,
    ) -> Result<(), StocktaError> {
        if series.len() != result.len() {
            return Err(StocktaError::Render {
                reason: format!(
                    "result has {} rows but series has {} bars",
                    result.len(),
                    series.len()
                ),
            });
        }
        if !signals.is_empty() && signals.len() != series.len() {
            return Err(StocktaError::Render {
                reason: format!(
                    "{} signals for {} bars",
                    signals.len(),
                    series.len()
                ),
            });
        }

        let cloud = cloud_column(result);
        let mut wtr = csv::Writer::from_path(output_path).map_err(csv_error)?;

        let mut header = vec!["date".to_string(), "close".to_string()];
        header.extend(result.lines.iter().map(|l| l.name.to_string()));
        if cloud.is_some() {
            header.push("cloud".to_string());
        }
        if !signals.is_empty() {
            header.push("signal".to_string());
        }
        wtr.write_record(&header).map_err(csv_error)?;

        for (i, bar) in series.bars().iter().enumerate() {
            let mut row = vec![bar.date.format("%Y-%m-%d").to_string(), bar.close.to_string()];
            row.extend(result.lines.iter().map(|l| cell(l.values[i])));
            if let Some(cloud) = &cloud {
                let label = match cloud[i] {
                    Some(CloudBias::Bullish) => "bullish",
                    Some(CloudBias::Bearish) => "bearish",
                    None => "",
                };
                row.push(label.to_string());
            }
            if let Some(signal) = signals.get(i) {
                row.push(signal_label(*signal).to_string());
            }
            wtr.write_record(&row).map_err(csv_error)?;
        }

        wtr.flush()?;
        info!(path = %output_path.display(), rows = series.len(), "wrote {} export", result.indicator_type);
        Ok(())
    }
}
