//! CSV file data adapter.
//!
//! Each symbol lives in `<base>/<SYMBOL>.csv` with a header row naming at least
//! `date,open,high,low,close`; `volume` is optional and extra columns are
//! ignored. Header names are matched case-insensitively, so downloads with
//! `Date,Open,High,Low,Close,Adj Close,Volume` load unchanged.

use crate::domain::error::StocktaError;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, StocktaError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| StocktaError::DataSource {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, StocktaError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| StocktaError::DataSource {
            reason: format!("missing {} value", name),
        })
}

fn parse_price(record: &StringRecord, idx: usize, name: &str) -> Result<f64, StocktaError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| StocktaError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(value: &str) -> Result<NaiveDate, StocktaError> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| StocktaError::DataSource {
        reason: format!("invalid date format '{}': {}", value, e),
    })
}

fn parse_volume(record: &StringRecord, idx: Option<usize>) -> Result<Option<i64>, StocktaError> {
    let Some(idx) = idx else {
        return Ok(None);
    };
    let raw = field(record, idx, "volume")?;
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
        .map(Some)
        .map_err(|e| StocktaError::DataSource {
            reason: format!("invalid volume value: {}", e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, StocktaError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no data file for symbol");
                return Ok(PriceSeries::empty(symbol));
            }
            Err(e) => {
                return Err(StocktaError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| StocktaError::DataSource {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StocktaError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(field(&record, columns.date, "date")?)?;
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_price(&record, columns.open, "open")?,
                high: parse_price(&record, columns.high, "high")?,
                low: parse_price(&record, columns.low, "low")?,
                close: parse_price(&record, columns.close, "close")?,
                volume: parse_volume(&record, columns.volume)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        info!(symbol, bars = bars.len(), %start_date, %end_date, "loaded price series");
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocktaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StocktaError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StocktaError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
