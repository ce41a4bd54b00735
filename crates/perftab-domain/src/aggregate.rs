use perftab_types::{AggregatedRecord, PerfRecord, RecordKey};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Collapse performance records into one row per
/// `(name, system, environ, Variable, Unit)` key.
///
/// Output is ordered by key. `Std` is the sample standard deviation
/// (n - 1 denominator) and is `None` for groups of one.
pub fn aggregate(records: &[PerfRecord]) -> Vec<AggregatedRecord> {
    let mut groups: BTreeMap<RecordKey, Vec<f64>> = BTreeMap::new();
    for r in records {
        groups.entry(r.key()).or_default().push(f64::from(r.value));
    }

    groups
        .into_iter()
        .map(|(key, values)| {
            let (mean, std) = mean_and_std(&values);
            AggregatedRecord { key, mean, std }
        })
        .collect()
}

/// Mean and sample standard deviation of `values`.
///
/// Values are summed in sorted order so the result does not depend on the
/// order in which samples arrived.
pub fn mean_and_std(values: &[f64]) -> (f64, Option<f64>) {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().mean();
    let std = if sorted.len() < 2 {
        None
    } else {
        Some(sorted.iter().std_dev()).filter(|s| !s.is_nan())
    };
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rec(name: &str, variable: &str, value: f32) -> PerfRecord {
        PerfRecord {
            name: name.to_string(),
            jobid: "1".to_string(),
            system: "archer2:compute".to_string(),
            environ: "PrgEnv-gnu".to_string(),
            variable: variable.to_string(),
            unit: "s".to_string(),
            value,
        }
    }

    #[test]
    fn groups_collapse_to_one_row_per_key() {
        let records = vec![
            rec("b", "time", 2.0),
            rec("a", "time", 1.0),
            rec("b", "time", 4.0),
            rec("a", "flops", 10.0),
        ];

        let out = aggregate(&records);
        assert_eq!(out.len(), 3);
        // Sorted by key: (a, flops), (a, time), (b, time).
        assert_eq!(out[0].key.variable, "flops");
        assert_eq!(out[1].key.name, "a");
        assert_eq!(out[2].key.name, "b");
        assert_relative_eq!(out[2].mean, 3.0);
        assert_relative_eq!(out[2].std.unwrap(), 2.0_f64.sqrt());
    }

    #[test]
    fn single_sample_has_no_std() {
        let out = aggregate(&[rec("a", "time", 5.0)]);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].mean, 5.0);
        assert_eq!(out[0].std, None);
    }

    #[test]
    fn identical_samples_have_zero_std() {
        let (mean, std) = mean_and_std(&[3.0, 3.0, 3.0]);
        assert_relative_eq!(mean, 3.0);
        assert_eq!(std, Some(0.0));
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std.unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn record_strategy() -> impl Strategy<Value = PerfRecord> {
            (
                prop_oneof![Just("a"), Just("b"), Just("c")],
                prop_oneof![Just("time"), Just("flops")],
                -1000.0f32..1000.0,
            )
                .prop_map(|(name, variable, value)| rec(name, variable, value))
        }

        proptest! {
            /// Output row count equals the number of distinct keys.
            #[test]
            fn prop_row_count_is_distinct_keys(records in prop::collection::vec(record_strategy(), 0..40)) {
                let distinct: BTreeSet<RecordKey> = records.iter().map(PerfRecord::key).collect();
                let out = aggregate(&records);
                prop_assert_eq!(out.len(), distinct.len());
                prop_assert!(out.len() <= records.len());
            }

            /// Aggregation does not depend on input order.
            #[test]
            fn prop_order_independent(records in prop::collection::vec(record_strategy(), 0..40)) {
                let mut reversed = records.clone();
                reversed.reverse();
                prop_assert_eq!(aggregate(&records), aggregate(&reversed));
            }
        }
    }
}
