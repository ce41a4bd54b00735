//! Cross-crate pipeline tests: JSON report text in, rendered table out.

use approx::assert_relative_eq;
use perftab_app::{render, TableRequest, TableUseCase};
use perftab_domain::{aggregate, compare, flatten};
use perftab_types::{ComparisonSet, OutputFormat, RecordSet, Report, ReportMode};

const BASELINE: &str = r#"{
  "session_info": {"cmdline": "reframe -r"},
  "runs": [
    {
      "num_cases": 2,
      "testcases": [
        {
          "display_name": "osu_latency %size=8",
          "jobid": 4711,
          "system": "archer2:compute",
          "environ": "PrgEnv-cray",
          "fail_phase": null,
          "perfvalues": {
            "archer2:compute:latency": [2.0, 2.1, -0.1, 0.1, "us"]
          }
        },
        {
          "display_name": "osu_bw",
          "jobid": null,
          "system": "archer2:compute",
          "environ": "PrgEnv-cray",
          "fail_phase": "run"
        }
      ]
    },
    {
      "testcases": [
        {
          "display_name": "osu_latency %size=8",
          "jobid": "4712",
          "system": "archer2:compute",
          "environ": "PrgEnv-cray",
          "fail_phase": null,
          "perfvalues": {
            "archer2:compute:latency": [2.2, 2.1, -0.1, 0.1, "us"]
          }
        }
      ]
    }
  ]
}"#;

const CANDIDATE: &str = r#"{
  "runs": [
    {
      "testcases": [
        {
          "display_name": "osu_latency %size=8",
          "jobid": 5001,
          "system": "archer2:compute",
          "environ": "PrgEnv-cray",
          "fail_phase": null,
          "perfvalues": {
            "archer2:compute:latency": [1.0, 2.1, -0.1, 0.1, "us"]
          }
        },
        {
          "display_name": "osu_latency %size=8",
          "jobid": 5002,
          "system": "archer2:compute",
          "environ": "PrgEnv-cray",
          "fail_phase": null,
          "perfvalues": {
            "archer2:compute:latency": [1.2, 2.1, -0.1, 0.1, "us"]
          }
        }
      ]
    }
  ]
}"#;

fn report(text: &str) -> Report {
    serde_json::from_str(text).expect("report parses")
}

#[test]
fn unknown_report_fields_are_ignored() {
    let report = report(BASELINE);
    assert_eq!(report.runs.len(), 2);
    assert_eq!(report.runs[0].testcases[1].jobid, None);
}

#[test]
fn pass_view_renders_null_jobid_as_empty() {
    let outcome = TableUseCase::execute(TableRequest {
        reports: vec![report(BASELINE)],
        mode: ReportMode::Pass,
        aggregate: false,
        compare: false,
        format: OutputFormat::Dsv,
        highlight: true,
    })
    .unwrap();

    let lines: Vec<&str> = outcome.rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[2],
        "1 osu_bw  archer2:compute PrgEnv-cray \"Failed: run\""
    );
    assert!(lines[1].starts_with("0 \"osu_latency %size=8\" 4711 "));
}

#[test]
fn flatten_aggregate_compare_by_hand_matches_use_case() {
    let sets: Vec<RecordSet> = [BASELINE, CANDIDATE]
        .iter()
        .map(|text| match flatten(&report(text), ReportMode::Performance).unwrap() {
            RecordSet::Performance(records) => RecordSet::Aggregated(aggregate(&records)),
            other => other,
        })
        .collect();
    let by_hand = compare(&sets).unwrap();

    let ComparisonSet::Means(means) = &by_hand else {
        panic!("expected a mean comparison");
    };
    assert_eq!(means.rows.len(), 1);
    let row = &means.rows[0];
    assert_relative_eq!(row.means[0], 2.1, epsilon = 1e-6);
    assert_relative_eq!(row.means[1], 1.1, epsilon = 1e-6);
    assert_relative_eq!(row.mean_diffs[0].unwrap(), -100.0 / 2.1, epsilon = 1e-4);

    let outcome = TableUseCase::execute(TableRequest {
        reports: vec![report(BASELINE), report(CANDIDATE)],
        mode: ReportMode::Performance,
        aggregate: true,
        compare: true,
        format: OutputFormat::Html,
        highlight: true,
    })
    .unwrap();

    assert_eq!(outcome.table, perftab_domain::annotate(&by_hand));
    assert_eq!(outcome.rendered, render(&outcome.table, OutputFormat::Html).unwrap());
    assert!(outcome.rendered.contains("class=\"significant\""));
    assert!(outcome.rendered.contains("osu_latency %size=8"));
}

#[test]
fn comparing_with_an_empty_side_yields_an_empty_table() {
    let empty = Report { runs: Vec::new() };
    let outcome = TableUseCase::execute(TableRequest {
        reports: vec![report(BASELINE), empty],
        mode: ReportMode::Performance,
        aggregate: true,
        compare: true,
        format: OutputFormat::Markdown,
        highlight: true,
    })
    .unwrap();

    assert!(outcome.table.rows.is_empty());
    assert!(outcome.rendered.contains("Mean Diff. 2-1[%]"));
}
