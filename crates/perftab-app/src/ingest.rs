//! Read a delimited comparison table back and pick the columns to plot.

use crate::chart::BarSeries;
use crate::render::DSV_DELIMITER;
use tracing::debug;

pub const DEFAULT_VALUE_COLUMN: &str = "Mean Diff. 2-1[%]";
pub const DEFAULT_ERROR_COLUMN: &str = "Std Diff. 2-1 [%]";
pub const DEFAULT_LABEL_COLUMN: &str = "name";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed delimited table: {0}")]
    Csv(#[from] csv::Error),

    #[error("table has no header row")]
    NoHeader,

    #[error("column {0:?} not found in table")]
    MissingColumn(String),
}

/// A delimited table as text cells. The first header is the unnamed
/// index column written by the dsv renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DsvTable {
    pub fn column(&self, name: &str) -> Result<usize, IngestError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn read_dsv(text: &str) -> Result<DsvTable, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DSV_DELIMITER)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(IngestError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(DsvTable { headers, rows })
}

/// Build the bar series for a chart.
///
/// Rows with an empty label or a missing/non-numeric value are dropped.
/// With an error column, rows whose error is missing or not positive are
/// dropped too.
pub fn bar_series(
    table: &DsvTable,
    value_column: &str,
    label_column: &str,
    error_column: Option<&str>,
) -> Result<BarSeries, IngestError> {
    let value_idx = table.column(value_column)?;
    let label_idx = table.column(label_column)?;
    let error_idx = error_column.map(|c| table.column(c)).transpose()?;

    let mut series = BarSeries {
        errors: error_idx.map(|_| Vec::new()),
        ..BarSeries::default()
    };

    for row in &table.rows {
        let label = row.get(label_idx).map(String::as_str).unwrap_or("");
        let Some(value) = row.get(value_idx).and_then(|c| parse_number(c)) else {
            continue;
        };
        if label.is_empty() {
            continue;
        }

        if let Some(idx) = error_idx {
            match row.get(idx).and_then(|c| parse_number(c)) {
                Some(e) if e > 0.0 => {
                    if let Some(errors) = series.errors.as_mut() {
                        errors.push(e);
                    }
                }
                _ => continue,
            }
        }

        series.labels.push(label.to_string());
        series.values.push(value);
    }

    debug!(
        kept = series.len(),
        dropped = table.len() - series.len(),
        "selected rows to plot"
    );
    Ok(series)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_dsv;
    use perftab_types::{Cell, Table};

    const COMPARISON: &str = concat!(
        " name system environ Variable Unit \"Mean Diff. 2-1[%]\" \"Std Diff. 2-1 [%]\"\n",
        "0 stream archer2 gnu Triad MB/s -10.0 7.0710678118654755\n",
        "1 hpcg archer2 gnu gflops GF/s 4.5 0.0\n",
        "2 lammps archer2 gnu time s  2.0\n",
        "3 gromacs archer2 gnu perf ns/day 1.5 NaN\n",
        "4 osu archer2 gnu bw GB/s 3.25 0.5\n",
    );

    #[test]
    fn reads_headers_including_unnamed_index() {
        let table = read_dsv(COMPARISON).unwrap();
        assert_eq!(table.headers[0], "");
        assert_eq!(table.headers[5], "Unit");
        assert_eq!(table.headers[6], "Mean Diff. 2-1[%]");
        assert_eq!(table.headers[7], "Std Diff. 2-1 [%]");
        assert_eq!(table.len(), 5);

        let mean = table.column(DEFAULT_VALUE_COLUMN).unwrap();
        assert_eq!(mean, 6);
        assert_eq!(table.rows[2][mean], "");
        assert_eq!(table.rows[2][table.column("Unit").unwrap()], "s");
    }

    #[test]
    fn keeps_rows_with_positive_error() {
        let table = read_dsv(COMPARISON).unwrap();
        let s = bar_series(
            &table,
            DEFAULT_VALUE_COLUMN,
            DEFAULT_LABEL_COLUMN,
            Some(DEFAULT_ERROR_COLUMN),
        )
        .unwrap();

        assert_eq!(s.labels, vec!["stream", "osu"]);
        assert_eq!(s.values, vec![-10.0, 3.25]);
        assert_eq!(s.errors, Some(vec![7.0710678118654755, 0.5]));
    }

    #[test]
    fn without_errors_only_missing_values_are_dropped() {
        let table = read_dsv(COMPARISON).unwrap();
        let s = bar_series(&table, DEFAULT_VALUE_COLUMN, DEFAULT_LABEL_COLUMN, None).unwrap();

        assert_eq!(s.labels, vec!["stream", "hpcg", "gromacs", "osu"]);
        assert!(s.errors.is_none());
    }

    #[test]
    fn unknown_column_is_reported() {
        let table = read_dsv(COMPARISON).unwrap();
        let err = bar_series(&table, "Mean Diff. 3-1[%]", "name", None).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(c) if c == "Mean Diff. 3-1[%]"));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(read_dsv(""), Err(IngestError::NoHeader)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = read_dsv(" a b\n0 x\n").unwrap_err();
        assert!(matches!(err, IngestError::Csv(_)));
    }

    #[test]
    fn reads_what_the_dsv_renderer_writes() {
        let table = Table::new(
            vec!["name".into(), "Mean Diff. 2-1[%]".into()],
            vec![
                vec![Cell::text("a b"), Cell::Float(-1.5)],
                vec![Cell::text("c"), Cell::Null],
            ],
        );
        let parsed = read_dsv(&render_dsv(&table).unwrap()).unwrap();
        let s = bar_series(&parsed, "Mean Diff. 2-1[%]", "name", None).unwrap();
        assert_eq!(s.labels, vec!["a b"]);
        assert_eq!(s.values, vec![-1.5]);
    }
}
