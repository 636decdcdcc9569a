//! Price data source port trait.

use crate::domain::error::StocktaError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` with `start_date <= date <= end_date`, ascending.
    ///
    /// A symbol or range without data yields an empty series, not an error.
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, StocktaError>;

    fn list_symbols(&self) -> Result<Vec<String>, StocktaError>;
}
