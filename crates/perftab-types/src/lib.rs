//! Shared types for perftab.
//!
//! Design goal: explicit, boring, fixed-schema.
//! The report structs mirror the JSON emitted by the regression-testing
//! framework; everything downstream works on the typed records in
//! [`records`] and the generic [`Table`] used for rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod records;
mod table;

pub use records::{
    AggregatedRecord, ComparisonSet, MeanComparison, MeanComparisonRecord, PassRecord,
    PerfRecord, RecordKey, RecordSet, Schema, ValueComparison, ValueComparisonRecord,
    mean_diff_column, std_diff_column, value_diff_column,
};
pub use table::{Cell, Table};

/// Label attached to exported points when none is given.
pub const DEFAULT_LABEL: &str = "regular";

/// Measurement name used for every exported point.
pub const MEASUREMENT: &str = "performance";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported format: {0} (expected dsv|markdown|html)")]
    UnsupportedFormat(String),

    #[error("unsupported report type: {0} (expected pass|performance)")]
    UnsupportedReportType(String),
}

// ----------------------------
// Input report schema
// ----------------------------

/// One parsed JSON report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Report {
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Run {
    pub testcases: Vec<Testcase>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Testcase {
    pub display_name: String,

    /// Scheduler job id. Must be present; `null` for local runs.
    #[serde(deserialize_with = "Option::deserialize")]
    #[schemars(with = "Option<JobId>")]
    pub jobid: Option<JobId>,

    pub system: String,
    pub environ: String,

    /// Name of the phase the test failed in. Must be present; `null` on pass.
    #[serde(deserialize_with = "Option::deserialize")]
    #[schemars(with = "Option<String>")]
    pub fail_phase: Option<String>,

    /// `"<system>:<partition>:<variable>" -> [value, reference, lower, upper, unit, ...]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perfvalues: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Testcase {
    /// Job id as rendered in tables; empty when the job id is `null`.
    pub fn jobid_display(&self) -> String {
        self.jobid
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum JobId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Text(s) => f.write_str(s),
            JobId::Number(n) => write!(f, "{n}"),
        }
    }
}

// ----------------------------
// Modes and formats
// ----------------------------

/// Which flat view of a report to produce.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    #[default]
    Pass,
    Performance,
}

impl FromStr for ReportMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(ReportMode::Pass),
            "performance" | "perf" => Ok(ReportMode::Performance),
            _ => Err(ParseError::UnsupportedReportType(s.to_string())),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Pass => f.write_str("pass"),
            ReportMode::Performance => f.write_str("performance"),
        }
    }
}

/// Supported text renderings of a table.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Space-delimited values with a leading index column.
    #[default]
    Dsv,
    /// Pipe table.
    Markdown,
    /// HTML table without row index.
    Html,
}

impl FromStr for OutputFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dsv" => Ok(OutputFormat::Dsv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            _ => Err(ParseError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dsv => f.write_str("dsv"),
            OutputFormat::Markdown => f.write_str("markdown"),
            OutputFormat::Html => f.write_str("html"),
        }
    }
}

// ----------------------------
// Optional config file schema
// ----------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub influxdb: InfluxConfig,

    #[serde(default)]
    pub chart: ChartSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct InfluxConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Points per HTTP write; 1 writes every point on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Duration string parseable by humantime, e.g. "10s".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct ChartSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}
