//! SVG chart adapter implementing ChartPort.
//!
//! Overlay indicators (EMA, Bollinger, Ichimoku) are drawn on the price panel.
//! Oscillators (MACD, Stochastic, RSI) get a second panel below the closes,
//! with any reference levels drawn as dashed horizontal lines. Undefined
//! values break a line rather than being interpolated across. RSI buy and
//! sell signals are marked with triangles at the close.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::error::StocktaError;
use crate::domain::indicator::ichimoku::{SENKOU_A, SENKOU_B};
use crate::domain::indicator::{
    classify_cloud, CloudBias, IndicatorResult, IndicatorType, RsiSignal,
};
use crate::domain::ohlcv::PriceSeries;
use crate::ports::chart_port::{ChartPort, ReferenceLevel};

const WIDTH: f64 = 900.0;
const PADDING: f64 = 50.0;
const PRICE_PANEL_HEIGHT: f64 = 320.0;
const OSCILLATOR_PANEL_HEIGHT: f64 = 180.0;
const PANEL_GAP: f64 = 30.0;

const CLOSE_COLOR: &str = "#222222";
const LINE_COLORS: [&str; 5] = ["#1f77b4", "#ff7f0e", "#9467bd", "#8c564b", "#17becf"];
const BULLISH_FILL: &str = "#2ca02c";
const BEARISH_FILL: &str = "#d62728";
const LEVEL_COLOR: &str = "#888888";
const MARKER_SIZE: f64 = 5.0;

#[derive(Debug, Default)]
pub struct SvgChartAdapter;

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// Vertical mapping for one panel.
struct Panel {
    top: f64,
    height: f64,
    min: f64,
    max: f64,
}

impl Panel {
    fn new(top: f64, height: f64, min: f64, max: f64) -> Self {
        // Flat data still needs a non-zero span to scale against.
        let (min, max) = if max > min {
            (min, max)
        } else {
            (min - 1.0, max + 1.0)
        };
        Self {
            top,
            height,
            min,
            max,
        }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + self.height - (value - self.min) / (self.max - self.min) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn x_at(i: usize, n: usize) -> f64 {
    let plot_width = WIDTH - 2.0 * PADDING;
    if n > 1 {
        PADDING + i as f64 * plot_width / (n - 1) as f64
    } else {
        PADDING + plot_width / 2.0
    }
}

fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Splits a line into runs of consecutive defined points.
fn segments(values: &[Option<f64>], panel: &Panel) -> Vec<Vec<(f64, f64)>> {
    let n = values.len();
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((x_at(i, n), panel.y(*v))),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_line(svg: &mut String, values: &[Option<f64>], panel: &Panel, color: &str, width: f64) {
    for run in segments(values, panel) {
        if run.len() == 1 {
            let (x, y) = run[0];
            let _ = writeln!(svg, r#"<circle cx="{:.1}" cy="{:.1}" r="1.5" fill="{}"/>"#, x, y, color);
        } else {
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="{}" points="{}"/>"#,
                color,
                width,
                points_attr(&run)
            );
        }
    }
}

/// Up-triangles below the close for buys, down-triangles above it for sells.
fn write_signal_markers(svg: &mut String, closes: &[f64], signals: &[RsiSignal], panel: &Panel) {
    let n = closes.len();
    for (i, (close, signal)) in closes.iter().zip(signals).enumerate() {
        let x = x_at(i, n);
        let y = panel.y(*close);
        let (points, fill) = match signal {
            RsiSignal::Buy => {
                let tip = y + MARKER_SIZE;
                let base = tip + MARKER_SIZE;
                (
                    [(x, tip), (x - MARKER_SIZE, base), (x + MARKER_SIZE, base)],
                    BULLISH_FILL,
                )
            }
            RsiSignal::Sell => {
                let tip = y - MARKER_SIZE;
                let base = tip - MARKER_SIZE;
                (
                    [(x, tip), (x - MARKER_SIZE, base), (x + MARKER_SIZE, base)],
                    BEARISH_FILL,
                )
            }
            RsiSignal::Neutral => continue,
        };
        let _ = writeln!(
            svg,
            r#"<polygon class="signal" fill="{}" points="{}"/>"#,
            fill,
            points_attr(&points)
        );
    }
}

/// Fills the area between the two leading spans, one polygon per run of
/// positions sharing the same bias.
fn write_cloud(svg: &mut String, result: &IndicatorResult, panel: &Panel) {
    let (Some(span_a), Some(span_b)) = (result.line(SENKOU_A), result.line(SENKOU_B)) else {
        return;
    };
    let bias = classify_cloud(span_a, span_b);
    let n = bias.len();

    let mut start = 0;
    while start < n {
        let Some(current) = bias[start] else {
            start += 1;
            continue;
        };
        let mut end = start;
        while end + 1 < n && bias[end + 1] == Some(current) {
            end += 1;
        }

        let mut outline: Vec<(f64, f64)> = (start..=end)
            .filter_map(|i| span_a[i].map(|v| (x_at(i, n), panel.y(v))))
            .collect();
        outline.extend(
            (start..=end)
                .rev()
                .filter_map(|i| span_b[i].map(|v| (x_at(i, n), panel.y(v)))),
        );
        let fill = match current {
            CloudBias::Bullish => BULLISH_FILL,
            CloudBias::Bearish => BEARISH_FILL,
        };
        let _ = writeln!(
            svg,
            r#"<polygon fill="{}" fill-opacity="0.2" stroke="none" points="{}"/>"#,
            fill,
            points_attr(&outline)
        );
        start = end + 1;
    }
}

fn write_axes(svg: &mut String, panel: &Panel) {
    let _ = writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{}"/>"#,
        PADDING,
        panel.top,
        WIDTH - 2.0 * PADDING,
        panel.height,
        LEVEL_COLOR
    );
    for value in [panel.max, panel.min] {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.2}</text>"#,
            PADDING - 4.0,
            panel.y(value) + 3.0,
            value
        );
    }
}

fn write_legend(svg: &mut String, entries: &[(&str, &str)], y: f64) {
    let mut x = PADDING;
    for (label, color) in entries {
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="10" height="3" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="10">{}</text>"#,
            x,
            y - 4.0,
            color,
            x + 14.0,
            y,
            escape_xml(label)
        );
        x += 14.0 + 7.0 * label.len() as f64 + 12.0;
    }
}

fn build_svg(
    series: &PriceSeries,
    result: &IndicatorResult,
    levels: &[ReferenceLevel],
    signals: &[RsiSignal],
) -> Result<String, StocktaError> {
    if series.is_empty() {
        return Err(StocktaError::Render {
            reason: format!("no bars to chart for {}", series.symbol()),
        });
    }
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
            reason: format!("{} signals for {} bars", signals.len(), series.len()),
        });
    }

    let overlay = result.indicator_type.is_overlay();
    let closes: Vec<Option<f64>> = series.closes().into_iter().map(Some).collect();
    let defined: Vec<f64> = result
        .lines
        .iter()
        .flat_map(|l| l.values.iter().flatten().copied())
        .collect();

    let price_top = PADDING;
    let price_range = if overlay {
        value_range(closes.iter().flatten().chain(defined.iter()))
    } else {
        value_range(closes.iter().flatten())
    };
    let (price_min, price_max) = price_range.unwrap_or((0.0, 1.0));
    let price_panel = Panel::new(price_top, PRICE_PANEL_HEIGHT, price_min, price_max);

    let oscillator_panel = (!overlay).then(|| {
        let level_values: Vec<f64> = levels.iter().map(|l| l.value).collect();
        let (min, max) =
            value_range(defined.iter().chain(level_values.iter())).unwrap_or((0.0, 1.0));
        Panel::new(
            price_panel.bottom() + PANEL_GAP,
            OSCILLATOR_PANEL_HEIGHT,
            min,
            max,
        )
    });

    let height = oscillator_panel
        .as_ref()
        .map_or(price_panel.bottom(), Panel::bottom)
        + PADDING;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
        WIDTH, height, WIDTH, height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="14" font-weight="bold">{}: {}</text>"#,
        PADDING,
        PADDING - 24.0,
        escape_xml(series.symbol()),
        escape_xml(&result.indicator_type.to_string())
    );

    let mut legend = vec![("close", CLOSE_COLOR)];
    let line_colors: Vec<(&str, &str)> = result
        .lines
        .iter()
        .enumerate()
        .map(|(i, l)| (l.name, LINE_COLORS[i % LINE_COLORS.len()]))
        .collect();
    legend.extend(line_colors.iter().copied());
    write_legend(&mut svg, &legend, PADDING - 8.0);

    write_axes(&mut svg, &price_panel);
    if matches!(result.indicator_type, IndicatorType::Ichimoku { .. }) {
        write_cloud(&mut svg, result, &price_panel);
    }
    write_line(&mut svg, &closes, &price_panel, CLOSE_COLOR, 1.5);
    write_signal_markers(&mut svg, &series.closes(), signals, &price_panel);

    let indicator_panel = oscillator_panel.as_ref().unwrap_or(&price_panel);
    if let Some(panel) = &oscillator_panel {
        write_axes(&mut svg, panel);
        for level in levels {
            let y = panel.y(level.value);
            let _ = writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-dasharray="4,3"/><text x="{:.1}" y="{:.1}" font-size="10">{}</text>"#,
                PADDING,
                y,
                WIDTH - PADDING,
                y,
                LEVEL_COLOR,
                WIDTH - PADDING + 4.0,
                y + 3.0,
                escape_xml(&level.label)
            );
        }
    }
    for (line, (_, color)) in result.lines.iter().zip(&line_colors) {
        write_line(&mut svg, &line.values, indicator_panel, color, 1.0);
    }

    let dates = series.dates();
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        let baseline = indicator_panel.bottom() + 14.0;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10">{}</text><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{}</text>"#,
            PADDING, baseline, first, WIDTH - PADDING, baseline, last
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

impl ChartPort for SvgChartAdapter {
    fn render(
        &self,
        series: &PriceSeries,
        result: &IndicatorResult,
        levels: &[ReferenceLevel],
        signals: &[RsiSignal],
        output_path: &Path,
    ) -> Result<(), StocktaError> {
        let svg = build_svg(series, result, levels, signals)?;
        fs::write(output_path, svg)?;
        info!(path = %output_path.display(), "wrote {} chart", result.indicator_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{
        calculate_bollinger, calculate_ichimoku, calculate_rsi, classify_rsi, BollingerParams,
        IchimokuParams, RsiParams, RsiThresholds,
    };
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 2.0,
                low: close - 3.0,
                close,
                volume: Some(1000),
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i % 7) as f64 * 1.5 - (i % 3) as f64)
            .collect()
    }

    #[test]
    fn segments_break_at_undefined_values() {
        let panel = Panel::new(0.0, 100.0, 0.0, 10.0);
        let values = [None, Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let runs = segments(&values, &panel);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 3);
    }

    #[test]
    fn segments_of_all_undefined_is_empty() {
        let panel = Panel::new(0.0, 100.0, 0.0, 10.0);
        assert!(segments(&[None, None], &panel).is_empty());
    }

    #[test]
    fn flat_panel_still_scales() {
        let panel = Panel::new(0.0, 100.0, 5.0, 5.0);
        let y = panel.y(5.0);
        assert!(y.is_finite());
        assert!((y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn overlay_chart_has_single_panel() {
        let series = make_series(&zigzag(40));
        let result = calculate_bollinger(&series, &BollingerParams::default()).unwrap();
        let svg = build_svg(&series, &result, &[], &[]).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("TEST: BOLLINGER(20,2,trailing)"));
        assert!(svg.contains("upper"));
        let frame = format!(r#"fill="none" stroke="{}"/>"#, LEVEL_COLOR);
        assert_eq!(svg.matches(&frame).count(), 1);
    }

    #[test]
    fn oscillator_chart_draws_reference_levels() {
        let series = make_series(&zigzag(40));
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let levels = [
            ReferenceLevel::new("buy", 30.0),
            ReferenceLevel::new("sell", 70.0),
        ];
        let svg = build_svg(&series, &result, &levels, &[]).unwrap();

        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains(">buy</text>"));
        assert!(svg.contains(">sell</text>"));
    }

    #[test]
    fn ichimoku_chart_fills_cloud() {
        let prices: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&prices);
        let result = calculate_ichimoku(&series, &IchimokuParams::default()).unwrap();
        let svg = build_svg(&series, &result, &[], &[]).unwrap();

        assert!(svg.contains(&format!(r#"<polygon fill="{}""#, BULLISH_FILL)));
        assert!(!svg.contains(&format!(r#"<polygon fill="{}""#, BEARISH_FILL)));
    }

    #[test]
    fn empty_series_is_a_render_error() {
        let series = PriceSeries::empty("NONE");
        let result = IndicatorResult::new(IndicatorType::Rsi(14), Vec::new());
        let err = build_svg(&series, &result, &[], &[]).unwrap_err();
        assert!(matches!(err, StocktaError::Render { .. }));
    }

    #[test]
    fn render_overwrites_output_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.svg");
        fs::write(&path, "stale").unwrap();

        let series = make_series(&zigzag(30));
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        SvgChartAdapter::new().render(&series, &result, &[], &[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn render_into_missing_directory_fails() {
        let series = make_series(&zigzag(30));
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let err = SvgChartAdapter::new()
            .render(&series, &result, &[], &[], Path::new("/nonexistent/dir/chart.svg"))
            .unwrap_err();
        assert!(matches!(err, StocktaError::Io(_)));
    }

    #[test]
    fn rsi_signals_are_marked_at_the_close() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&prices);
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let signals = classify_rsi(result.line("rsi").unwrap(), &RsiThresholds::default());
        let svg = build_svg(&series, &result, &[], &signals).unwrap();

        let sell = format!(r#"<polygon class="signal" fill="{}""#, BEARISH_FILL);
        let buy = format!(r#"<polygon class="signal" fill="{}""#, BULLISH_FILL);
        assert_eq!(svg.matches(&sell).count(), 19);
        assert_eq!(svg.matches(&buy).count(), 0);
    }

    #[test]
    fn chart_without_signals_has_no_markers() {
        let series = make_series(&zigzag(30));
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let svg = build_svg(&series, &result, &[], &[]).unwrap();
        assert!(!svg.contains(r#"class="signal""#));
    }

    #[test]
    fn mismatched_signals_are_a_render_error() {
        let series = make_series(&zigzag(30));
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let err = build_svg(&series, &result, &[], &[RsiSignal::Buy]).unwrap_err();
        assert!(matches!(err, StocktaError::Render { .. }));
    }

    #[test]
    fn text_is_xml_escaped() {
        let bars = make_series(&zigzag(30)).bars().to_vec();
        let series = PriceSeries::new("A&B<C>", bars).unwrap();
        let result = calculate_rsi(&series, &RsiParams::default()).unwrap();
        let levels = [ReferenceLevel::new("<low & high>", 30.0)];
        let svg = build_svg(&series, &result, &levels, &[]).unwrap();

        assert!(svg.contains("A&amp;B&lt;C&gt;: "));
        assert!(svg.contains("&lt;low &amp; high&gt;"));
        assert!(!svg.contains("A&B"));
        assert!(!svg.contains("<low"));
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape_xml("close"), "close");
        assert_eq!(escape_xml("a<b>&c"), "a&lt;b&gt;&amp;c");
    }
}
