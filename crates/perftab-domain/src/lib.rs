//! Domain logic for perftab.
//!
//! This crate is intentionally I/O-free: it flattens parsed reports,
//! aggregates, joins and flags. Reading files and rendering text happen
//! elsewhere.

mod aggregate;
mod compare;
mod flatten;
mod significance;

pub use aggregate::{aggregate, mean_and_std};
pub use compare::{compare, ensure_enough_inputs, relative_diff, std_diff};
pub use flatten::{flatten, flatten_all, parse_perf_value, variable_name, PerfValue};
pub use significance::{annotate, is_significant, significant_comparisons};

use perftab_types::Schema;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DomainError {
    #[error("perfvalue key {key:?} has fewer than 3 ':'-separated segments")]
    MalformedKey { key: String },

    #[error("perfvalue {key:?} is malformed: {reason}")]
    MalformedPerfValue { key: String, reason: String },

    #[error("comparison needs at least 2 record sets, got {found}")]
    InsufficientInputs { found: usize },

    #[error("record set {index} has schema {found}, expected {expected}")]
    SchemaMismatch {
        index: usize,
        expected: Schema,
        found: Schema,
    },

    #[error("records with schema {0} cannot be compared")]
    NotComparable(Schema),
}
