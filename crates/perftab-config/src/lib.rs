//! Configuration loading and merging for perftab.
//!
//! Values come from, in order of precedence: command-line flags (which
//! clap also fills from the environment), the `perftab.toml` file, and
//! built-in defaults.

use perftab_adapters::{ConnectionDetails, DEFAULT_TIMEOUT};
use perftab_app::ChartConfig;
use perftab_types::{ChartSection, ConfigFile, DEFAULT_LABEL, InfluxConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "perftab.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing InfluxDB settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid timeout {value:?}: {source}")]
    Timeout {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("{0} must be at least 1")]
    NotPositive(&'static str),
}

/// Parse config file contents.
pub fn parse_config(text: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config file.
///
/// An explicit path must exist. Otherwise `perftab.toml` in `dir` is used
/// when present, and an empty config when not.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ConfigFile, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                debug!(path = %candidate.display(), "no config file, using defaults");
                return Ok(ConfigFile::default());
            }
            candidate
        }
    };

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    parse_config(&text, &path)
}

/// Export settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct InfluxOverrides {
    pub url: Option<String>,
    pub org: Option<String>,
    pub token: Option<String>,
    pub bucket: Option<String>,
    pub label: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub connection: ConnectionDetails,
    pub bucket: String,
    pub label: String,
    pub batch_size: usize,
    pub timeout: Duration,
}

pub fn resolve_export(
    file: &InfluxConfig,
    overrides: &InfluxOverrides,
) -> Result<ExportSettings, ConfigError> {
    let pick = |flag: &Option<String>, from_file: &Option<String>| {
        flag.clone()
            .or_else(|| from_file.clone())
            .filter(|v| !v.is_empty())
    };

    let url = pick(&overrides.url, &file.url);
    let org = pick(&overrides.org, &file.org);
    let token = pick(&overrides.token, &file.token);
    let bucket = pick(&overrides.bucket, &file.bucket);

    let missing: Vec<&'static str> = [
        ("url", url.is_none()),
        ("org", org.is_none()),
        ("token", token.is_none()),
        ("bucket", bucket.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(url), Some(org), Some(token), Some(bucket)) = (url, org, token, bucket) else {
        return Err(ConfigError::Missing(missing));
    };

    let batch_size = overrides.batch_size.or(file.batch_size).unwrap_or(1);
    if batch_size == 0 {
        return Err(ConfigError::NotPositive("batch_size"));
    }

    let timeout = match &file.timeout {
        Some(value) => humantime::parse_duration(value).map_err(|source| ConfigError::Timeout {
            value: value.clone(),
            source,
        })?,
        None => DEFAULT_TIMEOUT,
    };

    Ok(ExportSettings {
        connection: ConnectionDetails { url, org, token },
        bucket,
        label: pick(&overrides.label, &file.label).unwrap_or_else(|| DEFAULT_LABEL.to_string()),
        batch_size,
        timeout,
    })
}

/// Chart settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ChartOverrides {
    pub page_size: Option<usize>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub chart: ChartConfig,
    pub out_dir: PathBuf,
}

pub fn resolve_plot(
    file: &ChartSection,
    overrides: &ChartOverrides,
) -> Result<PlotSettings, ConfigError> {
    let d = ChartConfig::default();

    let page_size = overrides
        .page_size
        .or(file.page_size)
        .unwrap_or(d.page_size);
    if page_size == 0 {
        return Err(ConfigError::NotPositive("page_size"));
    }

    let chart = ChartConfig {
        page_size,
        positive_color: file.positive_color.clone().unwrap_or(d.positive_color),
        negative_color: file.negative_color.clone().unwrap_or(d.negative_color),
        title: overrides
            .title
            .clone()
            .or_else(|| file.title.clone())
            .unwrap_or(d.title),
        x_label: overrides
            .x_label
            .clone()
            .or_else(|| file.x_label.clone())
            .unwrap_or(d.x_label),
        y_label: overrides
            .y_label
            .clone()
            .or_else(|| file.y_label.clone())
            .unwrap_or(d.y_label),
        width: file.width.unwrap_or(d.width),
        row_height: file.row_height.unwrap_or(d.row_height),
        grid: file.grid.unwrap_or(d.grid),
    };

    let out_dir = overrides
        .out_dir
        .clone()
        .or_else(|| file.out_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(PlotSettings { chart, out_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_influx() -> InfluxConfig {
        InfluxConfig {
            url: Some("http://db:8086".into()),
            org: Some("epcc".into()),
            token: Some("file-token".into()),
            bucket: Some("reframe".into()),
            label: None,
            batch_size: None,
            timeout: None,
        }
    }

    #[test]
    fn missing_file_in_dir_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(None, dir.path()).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn discovers_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[influxdb]\nbucket = \"nightly\"\n\n[chart]\npage_size = 10\n",
        )
        .unwrap();

        let cfg = load_config(None, dir.path()).unwrap();
        assert_eq!(cfg.influxdb.bucket.as_deref(), Some("nightly"));
        assert_eq!(cfg.chart.page_size, Some(10));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = parse_config("[influxdb\nurl = 1", Path::new("perftab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn wrong_value_type_is_a_parse_error() {
        let err = parse_config("[chart]\npage_size = \"many\"\n", Path::new("p.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn flags_override_file() {
        let overrides = InfluxOverrides {
            token: Some("flag-token".into()),
            label: Some("nightly".into()),
            batch_size: Some(50),
            ..Default::default()
        };
        let s = resolve_export(&full_influx(), &overrides).unwrap();
        assert_eq!(s.connection.token, "flag-token");
        assert_eq!(s.connection.url, "http://db:8086");
        assert_eq!(s.label, "nightly");
        assert_eq!(s.batch_size, 50);
        assert_eq!(s.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn defaults_fill_label_and_batch_size() {
        let s = resolve_export(&full_influx(), &InfluxOverrides::default()).unwrap();
        assert_eq!(s.label, "regular");
        assert_eq!(s.batch_size, 1);
    }

    #[test]
    fn missing_settings_are_named() {
        let file = InfluxConfig {
            url: Some("http://db:8086".into()),
            token: Some(String::new()),
            ..Default::default()
        };
        let err = resolve_export(&file, &InfluxOverrides::default()).unwrap_err();
        assert_eq!(err.to_string(), "missing InfluxDB settings: org, token, bucket");
    }

    #[test]
    fn timeout_is_parsed_with_humantime() {
        let mut file = full_influx();
        file.timeout = Some("1m 30s".into());
        let s = resolve_export(&file, &InfluxOverrides::default()).unwrap();
        assert_eq!(s.timeout, Duration::from_secs(90));

        file.timeout = Some("soon".into());
        let err = resolve_export(&file, &InfluxOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Timeout { .. }));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let overrides = InfluxOverrides {
            batch_size: Some(0),
            ..Default::default()
        };
        let err = resolve_export(&full_influx(), &overrides).unwrap_err();
        assert_eq!(err.to_string(), "batch_size must be at least 1");
    }

    #[test]
    fn chart_defaults() {
        let s = resolve_plot(&ChartSection::default(), &ChartOverrides::default()).unwrap();
        assert_eq!(s.chart, ChartConfig::default());
        assert_eq!(s.out_dir, PathBuf::from("."));
    }

    #[test]
    fn chart_file_and_flags_merge() {
        let file = ChartSection {
            page_size: Some(10),
            positive_color: Some("steelblue".into()),
            title: Some("From file".into()),
            grid: Some(false),
            out_dir: Some("charts".into()),
            ..Default::default()
        };
        let overrides = ChartOverrides {
            title: Some("From flag".into()),
            ..Default::default()
        };
        let s = resolve_plot(&file, &overrides).unwrap();
        assert_eq!(s.chart.page_size, 10);
        assert_eq!(s.chart.positive_color, "steelblue");
        assert_eq!(s.chart.negative_color, "lightcoral");
        assert_eq!(s.chart.title, "From flag");
        assert!(!s.chart.grid);
        assert_eq!(s.out_dir, PathBuf::from("charts"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let overrides = ChartOverrides {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            resolve_plot(&ChartSection::default(), &overrides),
            Err(ConfigError::NotPositive("page_size"))
        ));
    }
}
