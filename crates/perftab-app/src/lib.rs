//! Application layer for perftab.
//!
//! The app layer coordinates adapters and domain logic.
//! It does not parse CLI flags and it does not do filesystem I/O.

pub mod chart;
mod export;
pub mod ingest;
mod render;

pub use chart::{BarChartRenderer, BarSeries, ChartConfig, ChartError, ChartPage};
pub use export::{point_for, ExportOutcome, ExportRequest, ExportUseCase};
pub use ingest::{bar_series, read_dsv, DsvTable, IngestError};
pub use render::{render, render_dsv, render_html, render_markdown, DSV_DELIMITER};

use anyhow::{bail, Context};
use perftab_domain::{aggregate, annotate, compare, ensure_enough_inputs, flatten, flatten_all};
use perftab_types::{OutputFormat, RecordSet, Report, ReportMode, Table};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TableRequest {
    /// Parsed reports, in argument order.
    pub reports: Vec<Report>,
    pub mode: ReportMode,
    pub aggregate: bool,
    pub compare: bool,
    pub format: OutputFormat,

    /// Mark significant regressions in markdown and HTML output.
    pub highlight: bool,
}

#[derive(Debug, Clone)]
pub struct TableOutcome {
    pub table: Table,
    pub rendered: String,
}

/// Flatten, optionally aggregate and compare, then render.
///
/// Without `compare`, every report is flattened into one concatenated
/// record set. With `compare`, each report is one side of the join.
pub struct TableUseCase;

impl TableUseCase {
    /// Reject flag combinations before any report is read.
    pub fn validate(
        report_count: usize,
        mode: ReportMode,
        aggregate: bool,
        compare: bool,
    ) -> anyhow::Result<()> {
        if compare {
            ensure_enough_inputs(report_count)?;
        }
        if aggregate && mode == ReportMode::Pass {
            bail!("--aggregate needs performance records (use --type performance)");
        }
        Ok(())
    }

    pub fn execute(req: TableRequest) -> anyhow::Result<TableOutcome> {
        Self::validate(req.reports.len(), req.mode, req.aggregate, req.compare)?;

        let table = if req.compare {
            let sets = req
                .reports
                .iter()
                .enumerate()
                .map(|(i, report)| {
                    let set = flatten(report, req.mode)
                        .with_context(|| format!("failed to flatten report {}", i + 1))?;
                    Ok(maybe_aggregate(set, req.aggregate))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let comparison = compare(&sets).context("failed to compare reports")?;
            info!(
                inputs = comparison.inputs(),
                rows = comparison.len(),
                "compared record sets"
            );
            if req.highlight {
                annotate(&comparison)
            } else {
                comparison.to_table()
            }
        } else {
            let set = flatten_all(&req.reports, req.mode).context("failed to flatten reports")?;
            let set = maybe_aggregate(set, req.aggregate);
            info!(schema = %set.schema(), rows = set.len(), "flattened reports");
            set.to_table()
        };

        let rendered = render(&table, req.format)?;
        debug!(format = %req.format, bytes = rendered.len(), "rendered table");
        Ok(TableOutcome { table, rendered })
    }
}

fn maybe_aggregate(set: RecordSet, enabled: bool) -> RecordSet {
    match set {
        RecordSet::Performance(records) if enabled => RecordSet::Aggregated(aggregate(&records)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perftab_types::Cell;

    fn report(json: serde_json::Value) -> Report {
        serde_json::from_value(json).unwrap()
    }

    fn pass_report() -> Report {
        report(serde_json::json!({
            "runs": [{
                "testcases": [
                    {"display_name": "t1", "jobid": "1", "system": "s", "environ": "e", "fail_phase": null},
                    {"display_name": "t2", "jobid": "2", "system": "s", "environ": "e", "fail_phase": "sanity"}
                ]
            }]
        }))
    }

    fn perf_report(values: &[f64]) -> Report {
        let testcases: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::json!({
                    "display_name": "stream",
                    "jobid": i,
                    "system": "archer2",
                    "environ": "gnu",
                    "fail_phase": null,
                    "perfvalues": {
                        "archer2:compute:Triad": [v, 0, null, null, "MB/s"]
                    }
                })
            })
            .collect();
        report(serde_json::json!({ "runs": [{ "testcases": testcases }] }))
    }

    fn request(reports: Vec<Report>, mode: ReportMode) -> TableRequest {
        TableRequest {
            reports,
            mode,
            aggregate: false,
            compare: false,
            format: OutputFormat::Dsv,
            highlight: true,
        }
    }

    #[test]
    fn pass_view_renders_results() {
        let out = TableUseCase::execute(request(vec![pass_report()], ReportMode::Pass)).unwrap();
        assert_eq!(
            out.rendered,
            " name jobid system environ result\n0 t1 1 s e Passed\n1 t2 2 s e \"Failed: sanity\"\n"
        );
    }

    #[test]
    fn several_reports_without_compare_are_concatenated() {
        let out = TableUseCase::execute(request(
            vec![pass_report(), pass_report()],
            ReportMode::Pass,
        ))
        .unwrap();
        assert_eq!(out.table.rows.len(), 4);
    }

    #[test]
    fn aggregated_comparison_is_highlighted() {
        let mut req = request(
            vec![perf_report(&[98.0, 102.0]), perf_report(&[88.0, 92.0])],
            ReportMode::Performance,
        );
        req.aggregate = true;
        req.compare = true;
        req.format = OutputFormat::Markdown;

        let out = TableUseCase::execute(req).unwrap();
        assert_eq!(out.table.rows.len(), 1);
        let mean_diff = out.table.column_index("Mean Diff. 2-1[%]").unwrap();
        match &out.table.rows[0][mean_diff] {
            Cell::Float(v) => approx::assert_relative_eq!(*v, -10.0, epsilon = 1e-9),
            other => panic!("unexpected cell {other:?}"),
        }
        assert_eq!(out.table.highlighted, vec![true]);
        assert!(out.rendered.contains("**stream**"));
    }

    #[test]
    fn highlight_can_be_turned_off() {
        let mut req = request(
            vec![perf_report(&[98.0, 102.0]), perf_report(&[88.0, 92.0])],
            ReportMode::Performance,
        );
        req.aggregate = true;
        req.compare = true;
        req.highlight = false;

        let out = TableUseCase::execute(req).unwrap();
        assert_eq!(out.table.highlighted, vec![false]);
    }

    #[test]
    fn compare_needs_two_reports() {
        let err = TableUseCase::validate(1, ReportMode::Performance, false, true).unwrap_err();
        assert!(err.to_string().contains("at least 2"), "{err}");
    }

    #[test]
    fn aggregate_rejects_pass_view() {
        let err = TableUseCase::validate(1, ReportMode::Pass, true, false).unwrap_err();
        assert!(err.to_string().contains("--aggregate"), "{err}");
    }

    #[test]
    fn pass_reports_cannot_be_compared() {
        let mut req = request(vec![pass_report(), pass_report()], ReportMode::Pass);
        req.compare = true;
        let err = TableUseCase::execute(req).unwrap_err();
        assert!(format!("{err:#}").contains("cannot be compared"), "{err:#}");
    }
}
