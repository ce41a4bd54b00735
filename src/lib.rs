//! Perftab workspace-level test utilities.
//!
//! This crate exists solely to host workspace-level tests: the BDD
//! scenarios in `tests/cucumber.rs` and the cross-crate pipeline tests in
//! `tests/integration/`.
//!
//! The actual perftab functionality is in the workspace member crates:
//! - `perftab-types`: Report model, record sets and config schema
//! - `perftab-domain`: Flattening, aggregation, comparison, significance
//! - `perftab-adapters`: InfluxDB line protocol and HTTP writer
//! - `perftab-config`: Config file loading and setting resolution
//! - `perftab-app`: Table, export and chart use cases
//! - `perftab` (perftab-cli): CLI interface
