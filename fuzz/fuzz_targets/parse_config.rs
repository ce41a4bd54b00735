#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Parse as TOML config - only attempt if valid UTF-8
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = perftab_config::parse_config(s, Path::new("fuzz.toml")) {
            let _ = perftab_config::resolve_export(&config.influxdb, &Default::default());
            let _ = perftab_config::resolve_plot(&config.chart, &Default::default());
        }
    }
});
