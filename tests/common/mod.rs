#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use stockta::domain::error::StocktaError;
pub use stockta::domain::ohlcv::{OhlcvBar, PriceSeries};
use stockta::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, StocktaError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StocktaError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocktaError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: date(date_str),
        open: close,
        high: close + 2.0,
        low: close - 3.0,
        close,
        volume: Some(1_000),
    }
}

/// Consecutive calendar days starting at `start`, one bar per close.
pub fn bars_from_closes(start: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let first = date(start);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: first + chrono::Duration::days(i as i64),
            open: close,
            high: close + 2.0,
            low: close - 3.0,
            close,
            volume: Some(1_000 + i as i64),
        })
        .collect()
}

/// A deterministic oscillating series with an upward drift.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 0.3 * i as f64 + 5.0 * ((i as f64) / 4.0).sin())
        .collect()
}

pub fn make_series(symbol: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, bars_from_closes("2024-01-01", closes)).unwrap()
}

/// Write `<dir>/<symbol>.csv` in the layout the CSV data adapter reads.
pub fn write_symbol_csv(dir: &Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume.unwrap_or(0)
        ));
    }
    fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}
