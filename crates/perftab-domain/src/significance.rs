use perftab_types::{ComparisonSet, MeanComparisonRecord, Table};

/// A mean difference is a significant regression when it is negative and
/// larger in magnitude than its propagated uncertainty.
pub fn is_significant(mean_diff: Option<f64>, std_diff: Option<f64>) -> bool {
    match (mean_diff, std_diff) {
        (Some(m), Some(s)) => m < 0.0 && m.abs() > s,
        _ => false,
    }
}

/// Input indices (2-based, as in `Mean Diff. i-1[%]`) whose comparison
/// against the baseline is a significant regression.
pub fn significant_comparisons(record: &MeanComparisonRecord) -> Vec<usize> {
    record
        .mean_diffs
        .iter()
        .zip(&record.std_diffs)
        .enumerate()
        .filter(|(_, (m, s))| is_significant(**m, **s))
        .map(|(j, _)| j + 2)
        .collect()
}

/// Render a comparison as a table and highlight every row with at least
/// one significant comparison.
///
/// Highlighting is a flag on the table; cell values are left untouched.
/// Raw value comparisons carry no uncertainty and are never highlighted.
pub fn annotate(comparison: &ComparisonSet) -> Table {
    let mut table = comparison.to_table();
    if let ComparisonSet::Means(m) = comparison {
        table.highlighted = m
            .rows
            .iter()
            .map(|r| !significant_comparisons(r).is_empty())
            .collect();
    }
    table
}
