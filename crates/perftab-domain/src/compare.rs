use crate::DomainError;
use perftab_types::{
    AggregatedRecord, ComparisonSet, MeanComparison, MeanComparisonRecord, PerfRecord, RecordKey,
    RecordSet, Schema, ValueComparison, ValueComparisonRecord,
};
use std::collections::HashMap;

/// Fail unless at least two record sets take part in a comparison.
pub fn ensure_enough_inputs(found: usize) -> Result<(), DomainError> {
    if found < 2 {
        return Err(DomainError::InsufficientInputs { found });
    }
    Ok(())
}

/// Join `sets` on `(name, system, environ, Variable, Unit)` and derive
/// percentage differences relative to the first set.
///
/// All sets must share one schema. Only keys present in every set survive.
/// A zero baseline yields `None` for that cell only.
pub fn compare(sets: &[RecordSet]) -> Result<ComparisonSet, DomainError> {
    ensure_enough_inputs(sets.len())?;

    let expected = sets[0].schema();
    for (index, set) in sets.iter().enumerate().skip(1) {
        let found = set.schema();
        if found != expected {
            return Err(DomainError::SchemaMismatch {
                index: index + 1,
                expected,
                found,
            });
        }
    }

    match expected {
        Schema::Pass => Err(DomainError::NotComparable(Schema::Pass)),
        Schema::Performance => {
            let inputs: Vec<&[PerfRecord]> = sets
                .iter()
                .filter_map(|s| match s {
                    RecordSet::Performance(r) => Some(r.as_slice()),
                    _ => None,
                })
                .collect();
            Ok(ComparisonSet::Values(compare_values(&inputs)))
        }
        Schema::Aggregated => {
            let inputs: Vec<&[AggregatedRecord]> = sets
                .iter()
                .filter_map(|s| match s {
                    RecordSet::Aggregated(r) => Some(r.as_slice()),
                    _ => None,
                })
                .collect();
            Ok(ComparisonSet::Means(compare_means(&inputs)))
        }
    }
}

fn compare_values(inputs: &[&[PerfRecord]]) -> ValueComparison {
    let rows = inner_join(inputs, PerfRecord::key)
        .into_iter()
        .map(|(key, chain)| {
            let values: Vec<f32> = chain.iter().map(|r| r.value).collect();
            let baseline = f64::from(values[0]);
            let value_diffs = values[1..]
                .iter()
                .map(|v| relative_diff(baseline, f64::from(*v)))
                .collect();
            ValueComparisonRecord {
                key,
                jobids: chain.iter().map(|r| r.jobid.clone()).collect(),
                values,
                value_diffs,
            }
        })
        .collect();

    ValueComparison {
        inputs: inputs.len(),
        rows,
    }
}

fn compare_means(inputs: &[&[AggregatedRecord]]) -> MeanComparison {
    let rows = inner_join(inputs, |r: &AggregatedRecord| r.key.clone())
        .into_iter()
        .map(|(key, chain)| {
            let means: Vec<f64> = chain.iter().map(|r| r.mean).collect();
            let stds: Vec<Option<f64>> = chain.iter().map(|r| r.std).collect();
            let (base_mean, base_std) = (means[0], stds[0]);

            let mean_diffs = means[1..]
                .iter()
                .map(|m| relative_diff(base_mean, *m))
                .collect();
            let std_diffs = stds[1..]
                .iter()
                .map(|s| std_diff(base_mean, base_std, *s))
                .collect();

            MeanComparisonRecord {
                key,
                means,
                stds,
                mean_diffs,
                std_diffs,
            }
        })
        .collect();

    MeanComparison {
        inputs: inputs.len(),
        rows,
    }
}

/// Chained inner join, left to right.
///
/// Rows follow the order of the first input; a key that matches several
/// rows of a later input yields one chain per match, in that input's order.
fn inner_join<'a, R>(
    inputs: &[&'a [R]],
    key_of: impl Fn(&R) -> RecordKey,
) -> Vec<(RecordKey, Vec<&'a R>)> {
    let Some((first, rest)) = inputs.split_first() else {
        return Vec::new();
    };

    let mut joined: Vec<(RecordKey, Vec<&'a R>)> =
        first.iter().map(|r| (key_of(r), vec![r])).collect();

    for input in rest {
        let mut index: HashMap<RecordKey, Vec<&'a R>> = HashMap::new();
        for r in input.iter() {
            index.entry(key_of(r)).or_default().push(r);
        }

        joined = joined
            .into_iter()
            .flat_map(|(key, chain)| {
                let matches = index.get(&key).cloned().unwrap_or_default();
                matches.into_iter().map(move |m| {
                    let mut next = chain.clone();
                    next.push(m);
                    (key.clone(), next)
                })
            })
            .collect();
    }

    joined
}

/// `100 * (other - baseline) / baseline`, or `None` for a zero baseline.
pub fn relative_diff(baseline: f64, other: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some(100.0 * (other - baseline) / baseline)
}

/// Propagated uncertainty of a mean difference, in percent of the baseline:
/// `100 * sqrt(std_other^2 + std_base^2) / mean_base`.
///
/// `None` for a zero baseline or when either std is undefined.
pub fn std_diff(base_mean: f64, base_std: Option<f64>, other_std: Option<f64>) -> Option<f64> {
    if base_mean == 0.0 {
        return None;
    }
    let (b, o) = (base_std?, other_std?);
    Some(100.0 * (o * o + b * b).sqrt() / base_mean)
}
