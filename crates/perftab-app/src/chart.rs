//! Horizontal bar charts of relative performance differences, as SVG.
//!
//! One bar per row, colored by sign, with optional horizontal error bars.
//! Rows are split into pages; every page is a standalone SVG document.

use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChartError {
    #[error("{column} has {found} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("{column} entry {index} is not a finite number")]
    NonFinite { column: &'static str, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub page_size: usize,
    pub positive_color: String,
    pub negative_color: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Total width of a page in pixels.
    pub width: u32,
    /// Vertical space per bar in pixels.
    pub row_height: u32,
    pub grid: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            positive_color: "lightgreen".to_string(),
            negative_color: "lightcoral".to_string(),
            title: "System Performance Comparison".to_string(),
            x_label: "Performance Difference (%)".to_string(),
            y_label: "Test Cases".to_string(),
            width: 1200,
            row_height: 24,
            grid: true,
        }
    }
}

/// Labels and values of the bars, plus optional symmetric errors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub errors: Option<Vec<f64>>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate(&self) -> Result<(), ChartError> {
        let expected = self.values.len();
        if self.labels.len() != expected {
            return Err(ChartError::LengthMismatch {
                column: "labels",
                expected,
                found: self.labels.len(),
            });
        }
        if let Some(errors) = &self.errors {
            if errors.len() != expected {
                return Err(ChartError::LengthMismatch {
                    column: "errors",
                    expected,
                    found: errors.len(),
                });
            }
            if let Some(index) = errors.iter().position(|e| !e.is_finite()) {
                return Err(ChartError::NonFinite {
                    column: "errors",
                    index,
                });
            }
        }
        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(ChartError::NonFinite {
                column: "values",
                index,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPage {
    /// 0-based page number.
    pub index: usize,
    pub file_name: String,
    pub rows: usize,
    pub svg: String,
}

pub fn page_file_name(index: usize) -> String {
    format!("performance_comparison_page_{index}.svg")
}

pub struct BarChartRenderer {
    config: ChartConfig,
}

// Layout, in pixels.
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;
const MARGIN_RIGHT: f64 = 24.0;
const Y_LABEL_SPACE: f64 = 28.0;
const CHAR_WIDTH: f64 = 7.0;
const MAX_LABEL_SPACE: f64 = 480.0;
const BAR_FILL: f64 = 0.8;
const TARGET_TICKS: usize = 8;

impl BarChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn render(&self, series: &BarSeries) -> Result<Vec<ChartPage>, ChartError> {
        if self.config.page_size == 0 {
            return Err(ChartError::ZeroPageSize);
        }
        series.validate()?;

        let size = self.config.page_size;
        let mut pages = Vec::new();
        for (index, start) in (0..series.len()).step_by(size).enumerate() {
            let end = (start + size).min(series.len());
            let errors = series.errors.as_ref().map(|e| &e[start..end]);
            let svg = self.render_page(
                &series.labels[start..end],
                &series.values[start..end],
                errors,
            );
            debug!(page = index, rows = end - start, "rendered chart page");
            pages.push(ChartPage {
                index,
                file_name: page_file_name(index),
                rows: end - start,
                svg,
            });
        }
        Ok(pages)
    }

    fn render_page(&self, labels: &[String], values: &[f64], errors: Option<&[f64]>) -> String {
        let cfg = &self.config;
        let row_h = f64::from(cfg.row_height.max(1));
        let width = f64::from(cfg.width);

        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let label_space = (longest as f64 * CHAR_WIDTH + 12.0).min(MAX_LABEL_SPACE);
        let left = Y_LABEL_SPACE + label_space;
        let plot_w = (width - left - MARGIN_RIGHT).max(1.0);
        let plot_h = row_h * labels.len() as f64;
        let height = MARGIN_TOP + plot_h + MARGIN_BOTTOM;

        let (lo, hi) = value_range(values, errors);
        let ticks = nice_ticks(lo, hi, TARGET_TICKS);
        let lo = ticks.first().copied().unwrap_or(lo);
        let hi = ticks.last().copied().unwrap_or(hi);
        let x = |v: f64| left + (v - lo) / (hi - lo) * plot_w;
        let bottom = MARGIN_TOP + plot_h;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\" font-size=\"12\">\n",
            w = fmt_px(width),
            h = fmt_px(height),
        ));
        svg.push_str(&format!(
            "  <rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
            fmt_px(width),
            fmt_px(height)
        ));
        svg.push_str(&format!(
            "  <text class=\"title\" x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"14\" font-weight=\"bold\">{}</text>\n",
            fmt_px(left + plot_w / 2.0),
            fmt_px(MARGIN_TOP / 2.0 + 5.0),
            escape_xml(&cfg.title)
        ));

        let step = ticks
            .get(1)
            .zip(ticks.first())
            .map(|(b, a)| b - a)
            .unwrap_or(1.0);
        for &t in &ticks {
            let tx = fmt_px(x(t));
            if cfg.grid {
                svg.push_str(&format!(
                    "  <line class=\"grid\" x1=\"{tx}\" y1=\"{}\" x2=\"{tx}\" y2=\"{}\" stroke=\"black\" stroke-opacity=\"0.3\" stroke-width=\"0.5\"/>\n",
                    fmt_px(MARGIN_TOP),
                    fmt_px(bottom)
                ));
            }
            svg.push_str(&format!(
                "  <text class=\"tick\" x=\"{tx}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
                fmt_px(bottom + 16.0),
                tick_label(t, step)
            ));
        }

        for (i, (label, &v)) in labels.iter().zip(values).enumerate() {
            let top = MARGIN_TOP + row_h * i as f64;
            let center = top + row_h / 2.0;
            let bar_h = row_h * BAR_FILL;
            let x0 = x(0.0);
            let xv = x(v);
            let color = if v >= 0.0 {
                &cfg.positive_color
            } else {
                &cfg.negative_color
            };

            svg.push_str(&format!(
                "  <rect class=\"bar\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" fill-opacity=\"0.7\" stroke=\"black\" stroke-width=\"0.5\"/>\n",
                fmt_px(x0.min(xv)),
                fmt_px(center - bar_h / 2.0),
                fmt_px((xv - x0).abs()),
                fmt_px(bar_h),
                escape_xml(color)
            ));

            if let Some(e) = errors.map(|errs| errs[i]).filter(|e| *e > 0.0) {
                let (ex1, ex2) = (fmt_px(x(v - e)), fmt_px(x(v + e)));
                let cy = fmt_px(center);
                let cap = bar_h / 4.0;
                let (cy1, cy2) = (fmt_px(center - cap), fmt_px(center + cap));
                svg.push_str(&format!(
                    "  <g class=\"error\" stroke=\"black\" stroke-width=\"1\">\
                     <line x1=\"{ex1}\" y1=\"{cy}\" x2=\"{ex2}\" y2=\"{cy}\"/>\
                     <line x1=\"{ex1}\" y1=\"{cy1}\" x2=\"{ex1}\" y2=\"{cy2}\"/>\
                     <line x1=\"{ex2}\" y1=\"{cy1}\" x2=\"{ex2}\" y2=\"{cy2}\"/></g>\n"
                ));
            }

            svg.push_str(&format!(
                "  <text class=\"label\" x=\"{}\" y=\"{}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
                fmt_px(left - 6.0),
                fmt_px(center),
                escape_xml(label)
            ));
        }

        let zx = fmt_px(x(0.0));
        svg.push_str(&format!(
            "  <line class=\"zero\" x1=\"{zx}\" y1=\"{}\" x2=\"{zx}\" y2=\"{}\" stroke=\"black\" stroke-width=\"1\" stroke-opacity=\"0.8\"/>\n",
            fmt_px(MARGIN_TOP),
            fmt_px(bottom)
        ));
        svg.push_str(&format!(
            "  <rect class=\"frame\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"black\" stroke-width=\"0.8\"/>\n",
            fmt_px(left),
            fmt_px(MARGIN_TOP),
            fmt_px(plot_w),
            fmt_px(plot_h)
        ));
        svg.push_str(&format!(
            "  <text class=\"x-label\" x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
            fmt_px(left + plot_w / 2.0),
            fmt_px(height - 12.0),
            escape_xml(&cfg.x_label)
        ));
        let ly = fmt_px(MARGIN_TOP + plot_h / 2.0);
        svg.push_str(&format!(
            "  <text class=\"y-label\" x=\"14\" y=\"{ly}\" text-anchor=\"middle\" transform=\"rotate(-90 14 {ly})\">{}</text>\n",
            escape_xml(&cfg.y_label)
        ));
        svg.push_str("</svg>\n");
        svg
    }
}

/// Smallest interval that holds zero, every bar, and every error whisker.
fn value_range(values: &[f64], errors: Option<&[f64]>) -> (f64, f64) {
    let mut lo = 0.0_f64;
    let mut hi = 0.0_f64;
    for (i, &v) in values.iter().enumerate() {
        let e = errors.map(|errs| errs[i].abs()).unwrap_or(0.0);
        lo = lo.min(v - e);
        hi = hi.max(v + e);
    }
    if hi - lo <= f64::EPSILON {
        (-1.0, 1.0)
    } else {
        (lo, hi)
    }
}

/// Evenly spaced tick positions at a 1/2/5 x 10^k step, covering
/// `[lo, hi]` with roughly `target` intervals.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return vec![lo];
    }
    let raw = (hi - lo) / target.max(1) as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let step = mag
        * if norm < 1.5 {
            1.0
        } else if norm < 3.0 {
            2.0
        } else if norm < 7.0 {
            5.0
        } else {
            10.0
        };

    let first = (lo / step).floor();
    let last = (hi / step).ceil();
    let n = (last - first).round() as usize;
    (0..=n).map(|i| (first + i as f64) * step).collect()
}

fn tick_label(t: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    let t = if t.abs() < step * 1e-9 { 0.0 } else { t };
    format!("{t:.decimals$}")
}

fn fmt_px(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { "0".to_string() } else { format!("{r}") }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
