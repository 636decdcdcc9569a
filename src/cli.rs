//! CLI definition and dispatch.
//!
//! Every indicator command runs the same stages: load config, resolve
//! parameters (flags override config), fetch the series, compute, export,
//! then print the latest values.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::domain::error::StocktaError;
use crate::domain::indicator::ichimoku::{SENKOU_A, SENKOU_B};
use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_ichimoku, calculate_macd, calculate_rsi,
    calculate_stochastic, classify_cloud, classify_rsi, BollingerMode, BollingerParams,
    CloudBias, IchimokuParams, IndicatorResult, MacdParams, RsiParams, RsiSignal,
    RsiThresholds, SignalSummary, StochasticLevels, StochasticParams,
};
use crate::domain::indicator_config::{
    self, data_settings, validate_date_range, DEFAULT_END, DEFAULT_START,
};
use crate::domain::ohlcv::PriceSeries;
use crate::ports::chart_port::{ChartPort, ReferenceLevel};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_EMA_PERIOD: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "stockta", about = "Technical indicators over daily stock prices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every indicator command.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// Ticker symbol; data is read from `<data>/<SYMBOL>.csv`
    #[arg(short, long)]
    pub symbol: String,
    /// Directory of per-symbol CSV files (overrides `[data] directory`)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// First date to include, YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,
    /// Last date to include, YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Write every line of the result to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Write an SVG chart of the result
    #[arg(long)]
    pub chart: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MacdArgs {
    #[arg(long)]
    pub fast: Option<usize>,
    #[arg(long)]
    pub slow: Option<usize>,
    #[arg(long)]
    pub signal: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BollingerArgs {
    #[arg(long)]
    pub window: Option<usize>,
    #[arg(long)]
    pub num_std_dev: Option<f64>,
    /// `trailing` (default) or `expanding`
    #[arg(long)]
    pub mode: Option<BollingerMode>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IchimokuArgs {
    #[arg(long)]
    pub conversion: Option<usize>,
    #[arg(long)]
    pub base: Option<usize>,
    #[arg(long)]
    pub span_b: Option<usize>,
    #[arg(long)]
    pub displacement: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StochasticArgs {
    #[arg(long)]
    pub window: Option<usize>,
    #[arg(long)]
    pub smooth_k: Option<usize>,
    #[arg(long)]
    pub smooth_d: Option<usize>,
    #[arg(long)]
    pub overbought: Option<f64>,
    #[arg(long)]
    pub oversold: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RsiArgs {
    #[arg(long)]
    pub period: Option<usize>,
    /// Leave the first `period` values undefined
    #[arg(long)]
    pub warmup: bool,
    /// Define RSI from the second bar even if the config enables warmup
    #[arg(long, conflicts_with = "warmup")]
    pub no_warmup: bool,
    #[arg(long)]
    pub buy: Option<f64>,
    #[arg(long)]
    pub sell: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exponential moving average of closes
    Ema {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long, default_value_t = DEFAULT_EMA_PERIOD)]
        period: usize,
    },
    /// MACD line, signal line and histogram
    Macd {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        params: MacdArgs,
    },
    /// Bollinger bands
    Bollinger {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        params: BollingerArgs,
    },
    /// Ichimoku cloud
    Ichimoku {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        params: IchimokuArgs,
    },
    /// Stochastic oscillator (%K and %D)
    Stochastic {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        params: StochasticArgs,
    },
    /// Relative strength index with buy/sell signals
    Rsi {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        params: RsiArgs,
    },
    /// List symbols with a CSV file in the data directory
    ListSymbols {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Fully resolved parameters for one indicator run.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorRequest {
    Ema(usize),
    Macd(MacdParams),
    Bollinger(BollingerParams),
    Ichimoku(IchimokuParams),
    Stochastic(StochasticParams, StochasticLevels),
    Rsi(RsiParams, RsiThresholds),
}

/// A computed indicator plus what the presentation stage needs.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: IndicatorResult,
    pub levels: Vec<ReferenceLevel>,
    /// Per-bar RSI signals; empty for every other indicator.
    pub rsi_signals: Vec<RsiSignal>,
}

impl Analysis {
    pub fn signal_summary(&self) -> Option<SignalSummary> {
        (!self.rsi_signals.is_empty()).then(|| SignalSummary::from_signals(&self.rsi_signals))
    }
}

impl IndicatorRequest {
    pub fn compute(&self, series: &PriceSeries) -> Result<Analysis, StocktaError> {
        let analysis = match self {
            IndicatorRequest::Ema(period) => Analysis {
                result: calculate_ema(series, *period)?,
                levels: Vec::new(),
                rsi_signals: Vec::new(),
            },
            IndicatorRequest::Macd(params) => Analysis {
                result: calculate_macd(series, params)?,
                levels: vec![ReferenceLevel::new("zero", 0.0)],
                rsi_signals: Vec::new(),
            },
            IndicatorRequest::Bollinger(params) => Analysis {
                result: calculate_bollinger(series, params)?,
                levels: Vec::new(),
                rsi_signals: Vec::new(),
            },
            IndicatorRequest::Ichimoku(params) => Analysis {
                result: calculate_ichimoku(series, params)?,
                levels: Vec::new(),
                rsi_signals: Vec::new(),
            },
            IndicatorRequest::Stochastic(params, levels) => Analysis {
                result: calculate_stochastic(series, params)?,
                levels: vec![
                    ReferenceLevel::new("overbought", levels.overbought),
                    ReferenceLevel::new("oversold", levels.oversold),
                ],
                rsi_signals: Vec::new(),
            },
            IndicatorRequest::Rsi(params, thresholds) => {
                let result = calculate_rsi(series, params)?;
                let signals = result
                    .line(crate::domain::indicator::rsi::LINE)
                    .map(|values| classify_rsi(values, thresholds))
                    .unwrap_or_default();
                Analysis {
                    result,
                    levels: vec![
                        ReferenceLevel::new("buy", thresholds.buy),
                        ReferenceLevel::new("sell", thresholds.sell),
                    ],
                    rsi_signals: signals,
                }
            }
        };
        Ok(analysis)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::ListSymbols { data, config } => {
            run_list_symbols(data.as_deref(), config.as_deref())
        }
        Command::Ema { series, period } => {
            run_indicator(&series, |_| Ok(IndicatorRequest::Ema(period)))
        }
        Command::Macd { series, params } => run_indicator(&series, |c| resolve_macd(c, &params)),
        Command::Bollinger { series, params } => {
            run_indicator(&series, |c| resolve_bollinger(c, &params))
        }
        Command::Ichimoku { series, params } => {
            run_indicator(&series, |c| resolve_ichimoku(c, &params))
        }
        Command::Stochastic { series, params } => {
            run_indicator(&series, |c| resolve_stochastic(c, &params))
        }
        Command::Rsi { series, params } => run_indicator(&series, |c| resolve_rsi(c, &params)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    indicator_config::parse_date(value)
        .map_err(|e| format!("invalid date '{}', expected YYYY-MM-DD: {}", value, e))
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, StocktaError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// The `--data` flag wins over `[data] directory`.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, StocktaError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    data_settings(config)?
        .directory
        .ok_or_else(|| StocktaError::ConfigMissing {
            section: "data".to_string(),
            key: "directory".to_string(),
        })
}

pub fn resolve_date_range(
    args: &SeriesArgs,
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), StocktaError> {
    let settings = data_settings(config)?;
    let (sy, sm, sd) = DEFAULT_START;
    let (ey, em, ed) = DEFAULT_END;
    let start = args
        .start
        .or(settings.start_date)
        .or_else(|| NaiveDate::from_ymd_opt(sy, sm, sd))
        .ok_or_else(|| StocktaError::ConfigMissing {
            section: "data".to_string(),
            key: "start_date".to_string(),
        })?;
    let end = args
        .end
        .or(settings.end_date)
        .or_else(|| NaiveDate::from_ymd_opt(ey, em, ed))
        .ok_or_else(|| StocktaError::ConfigMissing {
            section: "data".to_string(),
            key: "end_date".to_string(),
        })?;
    validate_date_range(start, end)?;
    Ok((start, end))
}

pub fn resolve_macd(
    config: &dyn ConfigPort,
    args: &MacdArgs,
) -> Result<IndicatorRequest, StocktaError> {
    let base = indicator_config::macd_params(config)?;
    let params = MacdParams {
        fast: args.fast.unwrap_or(base.fast),
        slow: args.slow.unwrap_or(base.slow),
        signal: args.signal.unwrap_or(base.signal),
    };
    params.validate()?;
    Ok(IndicatorRequest::Macd(params))
}

pub fn resolve_bollinger(
    config: &dyn ConfigPort,
    args: &BollingerArgs,
) -> Result<IndicatorRequest, StocktaError> {
    let base = indicator_config::bollinger_params(config)?;
    let params = BollingerParams {
        window: args.window.unwrap_or(base.window),
        num_std_dev: args.num_std_dev.unwrap_or(base.num_std_dev),
        mode: args.mode.unwrap_or(base.mode),
    };
    params.validate()?;
    Ok(IndicatorRequest::Bollinger(params))
}

pub fn resolve_ichimoku(
    config: &dyn ConfigPort,
    args: &IchimokuArgs,
) -> Result<IndicatorRequest, StocktaError> {
    let base = indicator_config::ichimoku_params(config)?;
    let params = IchimokuParams {
        conversion: args.conversion.unwrap_or(base.conversion),
        base: args.base.unwrap_or(base.base),
        span_b: args.span_b.unwrap_or(base.span_b),
        displacement: args.displacement.unwrap_or(base.displacement),
    };
    params.validate()?;
    Ok(IndicatorRequest::Ichimoku(params))
}

pub fn resolve_stochastic(
    config: &dyn ConfigPort,
    args: &StochasticArgs,
) -> Result<IndicatorRequest, StocktaError> {
    let base = indicator_config::stochastic_params(config)?;
    let base_levels = indicator_config::stochastic_levels(config)?;
    let params = StochasticParams {
        window: args.window.unwrap_or(base.window),
        smooth_k: args.smooth_k.unwrap_or(base.smooth_k),
        smooth_d: args.smooth_d.unwrap_or(base.smooth_d),
    };
    let levels = StochasticLevels {
        overbought: args.overbought.unwrap_or(base_levels.overbought),
        oversold: args.oversold.unwrap_or(base_levels.oversold),
    };
    params.validate()?;
    levels.validate()?;
    Ok(IndicatorRequest::Stochastic(params, levels))
}

pub fn resolve_rsi(
    config: &dyn ConfigPort,
    args: &RsiArgs,
) -> Result<IndicatorRequest, StocktaError> {
    let base = indicator_config::rsi_params(config)?;
    let base_thresholds = indicator_config::rsi_thresholds(config)?;
    let params = RsiParams {
        period: args.period.unwrap_or(base.period),
        warmup: !args.no_warmup && (args.warmup || base.warmup),
    };
    let thresholds = RsiThresholds {
        buy: args.buy.unwrap_or(base_thresholds.buy),
        sell: args.sell.unwrap_or(base_thresholds.sell),
    };
    params.validate()?;
    thresholds.validate()?;
    Ok(IndicatorRequest::Rsi(params, thresholds))
}

/// Fetch and compute. An empty series is reported as `NoData`.
pub fn analyze(
    data_port: &dyn DataPort,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    request: &IndicatorRequest,
) -> Result<(PriceSeries, Analysis), StocktaError> {
    let series = data_port.fetch_series(symbol, start, end)?;
    if series.is_empty() {
        return Err(StocktaError::NoData {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    let analysis = request.compute(&series)?;
    info!(
        symbol,
        bars = series.len(),
        indicator = %analysis.result.indicator_type,
        "computed indicator"
    );
    Ok((series, analysis))
}

fn run_indicator<F>(args: &SeriesArgs, resolve: F) -> Result<(), StocktaError>
where
    F: FnOnce(&dyn ConfigPort) -> Result<IndicatorRequest, StocktaError>,
{
    let config = load_config(args.config.as_deref())?;
    let request = resolve(&config)?;
    let data_dir = resolve_data_dir(args.data.as_deref(), &config)?;
    let (start, end) = resolve_date_range(args, &config)?;

    let data_port = CsvAdapter::new(data_dir);
    let (series, analysis) = analyze(&data_port, &args.symbol, start, end, &request)?;

    if let Some(path) = &args.csv {
        CsvExportAdapter::new().render(
            &series,
            &analysis.result,
            &analysis.levels,
            &analysis.rsi_signals,
            path,
        )?;
    }
    if let Some(path) = &args.chart {
        SvgChartAdapter::new().render(
            &series,
            &analysis.result,
            &analysis.levels,
            &analysis.rsi_signals,
            path,
        )?;
    }

    print!("{}", format_summary(&series, &analysis));
    Ok(())
}

/// Console summary: the latest defined value of every line.
pub fn format_summary(series: &PriceSeries, analysis: &Analysis) -> String {
    let result = &analysis.result;
    let mut out = format!(
        "{} {} ({} bars",
        series.symbol(),
        result.indicator_type,
        series.len()
    );
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        out.push_str(&format!(", {} to {}", first, last));
    }
    out.push_str(")\n");

    for line in &result.lines {
        match result.latest(line.name) {
            Some((date, value)) => {
                out.push_str(&format!("  {:<14} {:>12.4}  ({})\n", line.name, value, date))
            }
            None => out.push_str(&format!("  {:<14} {:>12}\n", line.name, "n/a")),
        }
    }

    if let (Some(span_a), Some(span_b)) = (result.line(SENKOU_A), result.line(SENKOU_B)) {
        let latest = classify_cloud(span_a, span_b).into_iter().rev().flatten().next();
        let label = match latest {
            Some(CloudBias::Bullish) => "bullish",
            Some(CloudBias::Bearish) => "bearish",
            None => "n/a",
        };
        out.push_str(&format!("  {:<14} {:>12}\n", "cloud", label));
    }

    if let Some(signals) = analysis.signal_summary() {
        out.push_str(&format!(
            "  signals: {} buy, {} sell\n",
            signals.buys, signals.sells
        ));
    }
    out
}

fn run_list_symbols(data: Option<&Path>, config: Option<&Path>) -> Result<(), StocktaError> {
    let config = load_config(config)?;
    let data_dir = resolve_data_dir(data, &config)?;
    let symbols = CsvAdapter::new(data_dir).list_symbols()?;
    info!(count = symbols.len(), "listed symbols");
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}
