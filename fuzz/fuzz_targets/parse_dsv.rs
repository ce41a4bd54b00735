#![no_main]

use libfuzzer_sys::fuzz_target;
use perftab_app::ingest::{DEFAULT_ERROR_COLUMN, DEFAULT_LABEL_COLUMN, DEFAULT_VALUE_COLUMN};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = perftab_app::read_dsv(text) else {
        return;
    };

    if let Ok(series) = perftab_app::bar_series(
        &table,
        DEFAULT_VALUE_COLUMN,
        DEFAULT_LABEL_COLUMN,
        Some(DEFAULT_ERROR_COLUMN),
    ) {
        assert!(series.len() <= table.len());
        let _ = perftab_app::BarChartRenderer::new(Default::default()).render(&series);
    }
});
