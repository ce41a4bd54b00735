#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use perftab_types::{AggregatedRecord, RecordKey, RecordSet};

#[derive(Debug, Arbitrary)]
struct Sample {
    name: u8,
    mean: f64,
    std: Option<f64>,
}

fn record_set(samples: &[Sample]) -> RecordSet {
    RecordSet::Aggregated(
        samples
            .iter()
            .map(|s| AggregatedRecord {
                key: RecordKey {
                    name: format!("t{}", s.name % 4),
                    system: "sys".to_string(),
                    environ: "env".to_string(),
                    variable: "time".to_string(),
                    unit: "s".to_string(),
                },
                mean: s.mean,
                std: s.std,
            })
            .collect(),
    )
}

fuzz_target!(|input: (Vec<Sample>, Vec<Sample>)| {
    let sets = [record_set(&input.0), record_set(&input.1)];
    let Ok(comparison) = perftab_domain::compare(&sets) else {
        return;
    };

    let table = perftab_domain::annotate(&comparison);
    assert_eq!(table.rows.len(), table.highlighted.len());
    assert_eq!(table.columns.len(), comparison.columns().len());
});
