//! Indicator and data settings read from configuration.
//!
//! Every key is optional and falls back to the indicator's default; values
//! that are present but malformed are rejected before any computation runs.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::StocktaError;
use crate::domain::indicator::{
    BollingerMode, BollingerParams, IchimokuParams, MacdParams, RsiParams, RsiThresholds,
    StochasticLevels, StochasticParams,
};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_START: (i32, u32, u32) = (2024, 1, 1);
pub const DEFAULT_END: (i32, u32, u32) = (2025, 1, 1);

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub directory: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, StocktaError> {
    let directory = config.get_setting("data", "directory").map(PathBuf::from);
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        validate_date_range(start, end)?;
    }

    Ok(DataSettings {
        directory,
        start_date,
        end_date,
    })
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), StocktaError> {
    if start >= end {
        return Err(StocktaError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, StocktaError> {
    match config.get_setting(section, key) {
        None => Ok(None),
        Some(s) => parse_date(&s).map(Some).map_err(|_| StocktaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD", key),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> StocktaError {
    StocktaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StocktaError> {
    let Some(raw) = config.get_setting(section, key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| invalid(section, key, format!("'{}' is not a whole number", raw)))?;
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{} is too large", value)))
}

fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, StocktaError> {
    let Some(raw) = config.get_setting(section, key) else {
        return Ok(default);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(section, key, format!("'{}' is not a number", raw))),
    }
}

fn read_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, StocktaError> {
    let Some(raw) = config.get_setting(section, key) else {
        return Ok(default);
    };
    // A value the port cannot read as a flag falls back to whichever default it is given.
    let value = config.get_bool(section, key, true);
    if value != config.get_bool(section, key, false) {
        return Err(invalid(section, key, format!("'{}' is not a yes/no value", raw)));
    }
    Ok(value)
}

pub fn macd_params(config: &dyn ConfigPort) -> Result<MacdParams, StocktaError> {
    let defaults = MacdParams::default();
    let params = MacdParams {
        fast: read_period(config, "macd", "fast", defaults.fast)?,
        slow: read_period(config, "macd", "slow", defaults.slow)?,
        signal: read_period(config, "macd", "signal", defaults.signal)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn bollinger_params(config: &dyn ConfigPort) -> Result<BollingerParams, StocktaError> {
    let defaults = BollingerParams::default();
    let mode = match config.get_setting("bollinger", "mode") {
        Some(s) => s
            .parse::<BollingerMode>()
            .map_err(|reason| StocktaError::ConfigInvalid {
                section: "bollinger".to_string(),
                key: "mode".to_string(),
                reason,
            })?,
        None => defaults.mode,
    };

    let params = BollingerParams {
        window: read_period(config, "bollinger", "window", defaults.window)?,
        num_std_dev: read_number(config, "bollinger", "num_std_dev", defaults.num_std_dev)?,
        mode,
    };
    params.validate()?;
    Ok(params)
}

pub fn ichimoku_params(config: &dyn ConfigPort) -> Result<IchimokuParams, StocktaError> {
    let defaults = IchimokuParams::default();
    let params = IchimokuParams {
        conversion: read_period(config, "ichimoku", "conversion", defaults.conversion)?,
        base: read_period(config, "ichimoku", "base", defaults.base)?,
        span_b: read_period(config, "ichimoku", "span_b", defaults.span_b)?,
        displacement: read_period(config, "ichimoku", "displacement", defaults.displacement)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn stochastic_params(config: &dyn ConfigPort) -> Result<StochasticParams, StocktaError> {
    let defaults = StochasticParams::default();
    let params = StochasticParams {
        window: read_period(config, "stochastic", "window", defaults.window)?,
        smooth_k: read_period(config, "stochastic", "smooth_k", defaults.smooth_k)?,
        smooth_d: read_period(config, "stochastic", "smooth_d", defaults.smooth_d)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn stochastic_levels(config: &dyn ConfigPort) -> Result<StochasticLevels, StocktaError> {
    let defaults = StochasticLevels::default();
    let levels = StochasticLevels {
        overbought: read_number(config, "stochastic", "overbought", defaults.overbought)?,
        oversold: read_number(config, "stochastic", "oversold", defaults.oversold)?,
    };
    levels.validate()?;
    Ok(levels)
}

pub fn rsi_params(config: &dyn ConfigPort) -> Result<RsiParams, StocktaError> {
    let defaults = RsiParams::default();
    let params = RsiParams {
        period: read_period(config, "rsi", "period", defaults.period)?,
        warmup: read_flag(config, "rsi", "warmup", defaults.warmup)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn rsi_thresholds(config: &dyn ConfigPort) -> Result<RsiThresholds, StocktaError> {
    let defaults = RsiThresholds::default();
    let thresholds = RsiThresholds {
        buy: read_number(config, "rsi", "buy_threshold", defaults.buy)?,
        sell: read_number(config, "rsi", "sell_threshold", defaults.sell)?,
    };
    thresholds.validate()?;
    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = make_config("");
        assert_eq!(macd_params(&config).unwrap(), MacdParams::default());
        assert_eq!(bollinger_params(&config).unwrap(), BollingerParams::default());
        assert_eq!(ichimoku_params(&config).unwrap(), IchimokuParams::default());
        assert_eq!(stochastic_params(&config).unwrap(), StochasticParams::default());
        assert_eq!(stochastic_levels(&config).unwrap(), StochasticLevels::default());
        assert_eq!(rsi_params(&config).unwrap(), RsiParams::default());
        assert_eq!(rsi_thresholds(&config).unwrap(), RsiThresholds::default());

        let data = data_settings(&config).unwrap();
        assert_eq!(data.directory, None);
        assert_eq!(data.start_date, None);
    }

    #[test]
    fn full_config_is_read() {
        let config = make_config(
            r#"
[data]
directory = /srv/prices
start_date = 2023-01-01
end_date = 2023-12-31

[macd]
fast = 5
slow = 35
signal = 5

[bollinger]
window = 2
num_std_dev = 1.0
mode = expanding

[ichimoku]
conversion = 7
base = 22
span_b = 44
displacement = 22

[stochastic]
window = 10
smooth_k = 2
smooth_d = 4
overbought = 75
oversold = 25

[rsi]
period = 10
warmup = yes
buy_threshold = 35
sell_threshold = 65
"#,
        );

        let data = data_settings(&config).unwrap();
        assert_eq!(data.directory, Some(PathBuf::from("/srv/prices")));
        assert_eq!(data.start_date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(data.end_date, NaiveDate::from_ymd_opt(2023, 12, 31));

        assert_eq!(
            macd_params(&config).unwrap(),
            MacdParams {
                fast: 5,
                slow: 35,
                signal: 5
            }
        );

        let boll = bollinger_params(&config).unwrap();
        assert_eq!(boll.window, 2);
        assert_eq!(boll.num_std_dev, 1.0);
        assert_eq!(boll.mode, BollingerMode::Expanding);

        assert_eq!(ichimoku_params(&config).unwrap().span_b, 44);
        assert_eq!(stochastic_params(&config).unwrap().smooth_d, 4);
        assert_eq!(stochastic_levels(&config).unwrap().overbought, 75.0);

        let rsi = rsi_params(&config).unwrap();
        assert_eq!(rsi.period, 10);
        assert!(rsi.warmup);
        assert_eq!(rsi_thresholds(&config).unwrap(), RsiThresholds { buy: 35.0, sell: 65.0 });
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[rsi]\nperiod = 0\n");
        let err = rsi_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "period"));
    }

    #[test]
    fn negative_window_fails() {
        let config = make_config("[stochastic]\nwindow = -3\n");
        let err = stochastic_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { section, .. } if section == "stochastic"));
    }

    #[test]
    fn non_numeric_period_fails() {
        let config = make_config("[rsi]\nperiod = abc\n");
        let err = rsi_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "period"));
    }

    #[test]
    fn fractional_period_fails() {
        let config = make_config("[macd]\nsignal = 4.5\n");
        let err = macd_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "signal"));
    }

    #[test]
    fn non_numeric_multiplier_fails() {
        let config = make_config("[bollinger]\nnum_std_dev = wide\n");
        let err = bollinger_params(&config).unwrap_err();
        assert!(
            matches!(err, StocktaError::ConfigInvalid { section, key, .. } if section == "bollinger" && key == "num_std_dev")
        );
    }

    #[test]
    fn non_numeric_thresholds_fail() {
        let config = make_config("[rsi]\nsell_threshold = high\n");
        let err = rsi_thresholds(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "sell_threshold"));

        let config = make_config("[stochastic]\noversold = low\n");
        let err = stochastic_levels(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "oversold"));
    }

    #[test]
    fn unreadable_flag_fails() {
        let config = make_config("[rsi]\nwarmup = maybe\n");
        let err = rsi_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "warmup"));

        let config = make_config("[rsi]\nwarmup = off\n");
        assert!(!rsi_params(&config).unwrap().warmup);
    }

    #[test]
    fn non_finite_number_fails() {
        let config = make_config("[bollinger]\nnum_std_dev = inf\n");
        assert!(matches!(
            bollinger_params(&config),
            Err(StocktaError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = make_config("[rsi]\nperiod =\nbuy_threshold =\n");
        assert_eq!(rsi_params(&config).unwrap(), RsiParams::default());
        assert_eq!(rsi_thresholds(&config).unwrap(), RsiThresholds::default());
    }

    #[test]
    fn macd_fast_above_slow_fails() {
        let config = make_config("[macd]\nfast = 30\nslow = 26\n");
        let err = macd_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::Configuration { .. }));
    }

    #[test]
    fn unknown_bollinger_mode_fails() {
        let config = make_config("[bollinger]\nmode = rolling\n");
        let err = bollinger_params(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "mode"));
    }

    #[test]
    fn negative_std_dev_fails() {
        let config = make_config("[bollinger]\nnum_std_dev = -2\n");
        assert!(bollinger_params(&config).is_err());
    }

    #[test]
    fn inverted_rsi_thresholds_fail() {
        let config = make_config("[rsi]\nbuy_threshold = 80\nsell_threshold = 20\n");
        assert!(matches!(
            rsi_thresholds(&config),
            Err(StocktaError::Configuration { .. })
        ));
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[data]\nstart_date = 2020/01/01\n");
        let err = data_settings(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[data]\nstart_date = 2024-12-31\nend_date = 2020-01-01\n");
        let err = data_settings(&config).unwrap_err();
        assert!(matches!(err, StocktaError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn validate_date_range_rejects_equal_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(validate_date_range(d, d).is_err());
    }
}
