//! Flat record types produced from reports, and their explicit schemas.

use crate::table::{Cell, Table};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a performance sample across runs.
///
/// Ordering is lexicographic over `(name, system, environ, variable, unit)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub name: String,
    pub system: String,
    pub environ: String,
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Unit")]
    pub unit: String,
}

impl RecordKey {
    pub const COLUMNS: [&'static str; 5] = ["name", "system", "environ", "Variable", "Unit"];

    fn cells(&self) -> [Cell; 5] {
        [
            Cell::text(&self.name),
            Cell::text(&self.system),
            Cell::text(&self.environ),
            Cell::text(&self.variable),
            Cell::text(&self.unit),
        ]
    }
}

/// Pass/fail view of one testcase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PassRecord {
    pub name: String,
    pub jobid: String,
    pub system: String,
    pub environ: String,
    pub result: String,
}

/// One performance measurement of one testcase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PerfRecord {
    pub name: String,
    pub jobid: String,
    pub system: String,
    pub environ: String,
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Value")]
    pub value: f32,
}

impl PerfRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            system: self.system.clone(),
            environ: self.environ.clone(),
            variable: self.variable.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// Mean and sample standard deviation of all `Value`s sharing one key.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AggregatedRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    #[serde(rename = "Mean")]
    pub mean: f64,
    /// `None` when the group holds a single sample.
    #[serde(rename = "Std")]
    pub std: Option<f64>,
}

/// Column layout of a record set variant.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    Pass,
    Performance,
    Aggregated,
}

impl Schema {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Schema::Pass => &["name", "jobid", "system", "environ", "result"],
            Schema::Performance => &[
                "name", "jobid", "system", "environ", "Variable", "Unit", "Value",
            ],
            Schema::Aggregated => &["name", "system", "environ", "Variable", "Unit", "Mean", "Std"],
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.columns().join(", "))
    }
}

/// A flat record set; every variant carries a fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    Pass(Vec<PassRecord>),
    Performance(Vec<PerfRecord>),
    Aggregated(Vec<AggregatedRecord>),
}

impl RecordSet {
    pub fn schema(&self) -> Schema {
        match self {
            RecordSet::Pass(_) => Schema::Pass,
            RecordSet::Performance(_) => Schema::Performance,
            RecordSet::Aggregated(_) => Schema::Aggregated,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Pass(r) => r.len(),
            RecordSet::Performance(r) => r.len(),
            RecordSet::Aggregated(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_table(&self) -> Table {
        let columns = self.schema().columns().iter().map(|c| c.to_string()).collect();
        let rows = match self {
            RecordSet::Pass(records) => records
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.name),
                        Cell::text(&r.jobid),
                        Cell::text(&r.system),
                        Cell::text(&r.environ),
                        Cell::text(&r.result),
                    ]
                })
                .collect(),
            RecordSet::Performance(records) => records
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.name),
                        Cell::text(&r.jobid),
                        Cell::text(&r.system),
                        Cell::text(&r.environ),
                        Cell::text(&r.variable),
                        Cell::text(&r.unit),
                        Cell::from_f32(r.value),
                    ]
                })
                .collect(),
            RecordSet::Aggregated(records) => records
                .iter()
                .map(|r| {
                    let mut row = r.key.cells().to_vec();
                    row.push(Cell::Float(r.mean));
                    row.push(Cell::from_option(r.std));
                    row
                })
                .collect(),
        };
        Table::new(columns, rows)
    }
}

pub fn value_diff_column(i: usize) -> String {
    format!("Value Diff. {i}-1[%]")
}

pub fn mean_diff_column(i: usize) -> String {
    format!("Mean Diff. {i}-1[%]")
}

pub fn std_diff_column(i: usize) -> String {
    format!("Std Diff. {i}-1 [%]")
}

/// Joined raw performance records.
///
/// `jobids`/`values` hold one entry per input; `value_diffs[j]` compares
/// input `j + 2` with input 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueComparisonRecord {
    pub key: RecordKey,
    pub jobids: Vec<String>,
    pub values: Vec<f32>,
    pub value_diffs: Vec<Option<f64>>,
}

/// Joined aggregated records.
///
/// `mean_diffs[j]`/`std_diffs[j]` compare input `j + 2` with input 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanComparisonRecord {
    pub key: RecordKey,
    pub means: Vec<f64>,
    pub stds: Vec<Option<f64>>,
    pub mean_diffs: Vec<Option<f64>>,
    pub std_diffs: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueComparison {
    pub inputs: usize,
    pub rows: Vec<ValueComparisonRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanComparison {
    pub inputs: usize,
    pub rows: Vec<MeanComparisonRecord>,
}

/// Result of comparing N record sets against the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonSet {
    Values(ValueComparison),
    Means(MeanComparison),
}

impl ComparisonSet {
    pub fn inputs(&self) -> usize {
        match self {
            ComparisonSet::Values(c) => c.inputs,
            ComparisonSet::Means(c) => c.inputs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ComparisonSet::Values(c) => c.rows.len(),
            ComparisonSet::Means(c) => c.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key columns, then every input's suffixed columns, then derived columns.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = RecordKey::COLUMNS.iter().map(|c| c.to_string()).collect();
        let n = self.inputs();
        match self {
            ComparisonSet::Values(_) => {
                for i in 1..=n {
                    columns.push(format!("jobid_{i}"));
                    columns.push(format!("Value_{i}"));
                }
                for i in 2..=n {
                    columns.push(value_diff_column(i));
                }
            }
            ComparisonSet::Means(_) => {
                for i in 1..=n {
                    columns.push(format!("Mean_{i}"));
                    columns.push(format!("Std_{i}"));
                }
                for i in 2..=n {
                    columns.push(mean_diff_column(i));
                    columns.push(std_diff_column(i));
                }
            }
        }
        columns
    }

    pub fn to_table(&self) -> Table {
        let rows = match self {
            ComparisonSet::Values(c) => c
                .rows
                .iter()
                .map(|r| {
                    let mut row = r.key.cells().to_vec();
                    for (jobid, value) in r.jobids.iter().zip(&r.values) {
                        row.push(Cell::text(jobid));
                        row.push(Cell::from_f32(*value));
                    }
                    row.extend(r.value_diffs.iter().copied().map(Cell::from_option));
                    row
                })
                .collect(),
            ComparisonSet::Means(c) => c
                .rows
                .iter()
                .map(|r| {
                    let mut row = r.key.cells().to_vec();
                    for (mean, std) in r.means.iter().zip(&r.stds) {
                        row.push(Cell::Float(*mean));
                        row.push(Cell::from_option(*std));
                    }
                    for (mean_diff, std_diff) in r.mean_diffs.iter().zip(&r.std_diffs) {
                        row.push(Cell::from_option(*mean_diff));
                        row.push(Cell::from_option(*std_diff));
                    }
                    row
                })
                .collect(),
        };
        Table::new(self.columns(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> RecordKey {
        RecordKey {
            name: name.to_string(),
            system: "archer2:compute".to_string(),
            environ: "PrgEnv-gnu".to_string(),
            variable: "bandwidth".to_string(),
            unit: "MB/s".to_string(),
        }
    }

    #[test]
    fn schemas_differ_by_columns() {
        assert_ne!(Schema::Performance.columns(), Schema::Aggregated.columns());
        assert_eq!(Schema::Pass.columns().len(), 5);
        assert_eq!(Schema::Performance.columns().len(), 7);
    }

    #[test]
    fn aggregated_table_has_null_std() {
        let set = RecordSet::Aggregated(vec![AggregatedRecord {
            key: key("stream"),
            mean: 10.0,
            std: None,
        }]);
        let table = set.to_table();
        assert_eq!(table.columns, Schema::Aggregated.columns());
        assert_eq!(table.rows[0][5], Cell::Float(10.0));
        assert_eq!(table.rows[0][6], Cell::Null);
    }

    #[test]
    fn mean_comparison_columns_for_three_inputs() {
        let set = ComparisonSet::Means(MeanComparison {
            inputs: 3,
            rows: vec![],
        });
        let columns = set.columns();
        assert_eq!(
            &columns[5..],
            &[
                "Mean_1",
                "Std_1",
                "Mean_2",
                "Std_2",
                "Mean_3",
                "Std_3",
                "Mean Diff. 2-1[%]",
                "Std Diff. 2-1 [%]",
                "Mean Diff. 3-1[%]",
                "Std Diff. 3-1 [%]",
            ]
        );
    }

    #[test]
    fn value_comparison_row_matches_columns() {
        let set = ComparisonSet::Values(ValueComparison {
            inputs: 2,
            rows: vec![ValueComparisonRecord {
                key: key("stream"),
                jobids: vec!["1".into(), "2".into()],
                values: vec![10.0, 12.5],
                value_diffs: vec![Some(25.0)],
            }],
        });
        let table = set.to_table();
        assert_eq!(table.columns.len(), table.rows[0].len());
        assert_eq!(table.columns.last().unwrap(), "Value Diff. 2-1[%]");
        assert_eq!(table.rows[0].last().unwrap(), &Cell::Float(25.0));
    }

    #[test]
    fn aggregated_record_serializes_with_column_names() {
        let rec = AggregatedRecord {
            key: key("stream"),
            mean: 1.5,
            std: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["Variable"], "bandwidth");
        assert_eq!(json["Mean"], 1.5);
        assert!(json["Std"].is_null());
    }
}
