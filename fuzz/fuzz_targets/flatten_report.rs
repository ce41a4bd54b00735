#![no_main]

use libfuzzer_sys::fuzz_target;
use perftab_types::{OutputFormat, RecordSet, ReportMode};

fuzz_target!(|data: &[u8]| {
    let Ok(report) = serde_json::from_slice::<perftab_types::Report>(data) else {
        return;
    };

    if let Ok(set) = perftab_domain::flatten(&report, ReportMode::Pass) {
        let _ = perftab_app::render(&set.to_table(), OutputFormat::Markdown);
    }

    if let Ok(RecordSet::Performance(records)) =
        perftab_domain::flatten(&report, ReportMode::Performance)
    {
        let aggregated = RecordSet::Aggregated(perftab_domain::aggregate(&records));
        assert!(aggregated.len() <= records.len());
        for format in [OutputFormat::Dsv, OutputFormat::Html] {
            let _ = perftab_app::render(&aggregated.to_table(), format);
        }
    }
});
