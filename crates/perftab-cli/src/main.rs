use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use perftab_adapters::InfluxWriter;
use perftab_app::ingest::{DEFAULT_ERROR_COLUMN, DEFAULT_LABEL_COLUMN, DEFAULT_VALUE_COLUMN};
use perftab_app::{
    bar_series, read_dsv, BarChartRenderer, ExportRequest, ExportUseCase, TableRequest,
    TableUseCase,
};
use perftab_config::{
    load_config, resolve_export, resolve_plot, ChartOverrides, InfluxOverrides,
};
use perftab_domain::flatten_all;
use perftab_types::{ConfigFile, OutputFormat, RecordSet, Report, ReportMode};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "perftab",
    version,
    about = "Tabulate, compare, export and plot ReFrame test reports"
)]
struct Cli {
    /// Config file (default: ./perftab.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Flatten reports into a table and print it.
    Table {
        /// JSON report files
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Replace performance samples by per-test mean and std
        #[arg(long)]
        aggregate: bool,

        /// Join the reports side by side and add difference columns
        #[arg(long)]
        compare: bool,

        /// Which view of the report: pass or performance
        #[arg(long = "type", default_value = "pass")]
        report_type: ReportMode,

        /// Output format: dsv, markdown or html
        #[arg(long, default_value = "dsv")]
        format: OutputFormat,

        /// Write the table to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Do not mark significant regressions
        #[arg(long)]
        no_highlight: bool,
    },

    /// Write performance records to InfluxDB.
    Export {
        /// JSON report files
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        #[arg(long)]
        bucket: Option<String>,

        /// Database base URL, e.g. http://localhost:8086
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        org: Option<String>,

        /// API token
        #[arg(long, env = "PERFTAB_INFLUX_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Value of the `label` tag (default: regular)
        #[arg(long)]
        label: Option<String>,

        /// Points per write request (default: 1)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Render a delimited comparison table as bar chart pages (SVG).
    Plot {
        /// Table written by `perftab table --compare --format dsv`
        table: PathBuf,

        #[arg(long, default_value = DEFAULT_VALUE_COLUMN)]
        value_column: String,

        #[arg(long, default_value = DEFAULT_ERROR_COLUMN, conflicts_with = "no_errors")]
        error_column: String,

        /// Plot without error bars and keep rows without an error value
        #[arg(long)]
        no_errors: bool,

        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,

        /// Bars per page (default: 30)
        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        x_label: Option<String>,

        #[arg(long)]
        y_label: Option<String>,

        /// Directory for the page files (default: .)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            };
        }
    };

    init_logging(cli.verbose);

    if let Err(err) = real_main(cli) {
        eprintln!("{err:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Command::Table {
            reports,
            aggregate,
            compare,
            report_type,
            format,
            out,
            no_highlight,
        } => {
            // Flag problems are reported before any file is opened.
            TableUseCase::validate(reports.len(), report_type, aggregate, compare)?;

            let parsed = read_reports(&reports)?;
            let outcome = TableUseCase::execute(TableRequest {
                reports: parsed,
                mode: report_type,
                aggregate,
                compare,
                format,
                highlight: !no_highlight,
            })?;

            match out {
                Some(path) => {
                    write_text(&path, &outcome.rendered)?;
                    info!(path = %path.display(), "table written");
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout
                        .write_all(outcome.rendered.as_bytes())
                        .context("write table to stdout")?;
                }
            }
            Ok(())
        }

        Command::Export {
            reports,
            bucket,
            url,
            org,
            token,
            label,
            batch_size,
        } => {
            let config = load_config_file(cli.config.as_deref())?;
            let settings = resolve_export(
                &config.influxdb,
                &InfluxOverrides {
                    url,
                    org,
                    token,
                    bucket,
                    label,
                    batch_size,
                },
            )?;

            let parsed = read_reports(&reports)?;
            let records = match flatten_all(&parsed, ReportMode::Performance)
                .context("failed to flatten reports")?
            {
                RecordSet::Performance(records) => records,
                other => bail!("expected performance records, got {}", other.schema()),
            };
            if records.is_empty() {
                warn!("reports contain no performance values; nothing to export");
            }

            let writer = InfluxWriter::new(&settings.connection, settings.timeout)?;
            let mut usecase = ExportUseCase::new(writer);
            let outcome = usecase.execute(&ExportRequest {
                records,
                bucket: settings.bucket.clone(),
                label: settings.label,
                batch_size: settings.batch_size,
            })?;

            println!(
                "exported {} points to bucket {} in {} writes",
                outcome.written, settings.bucket, outcome.writes
            );
            Ok(())
        }

        Command::Plot {
            table,
            value_column,
            error_column,
            no_errors,
            label_column,
            page_size,
            title,
            x_label,
            y_label,
            out_dir,
        } => {
            let config = load_config_file(cli.config.as_deref())?;
            let settings = resolve_plot(
                &config.chart,
                &ChartOverrides {
                    page_size,
                    title,
                    x_label,
                    y_label,
                    out_dir,
                },
            )?;

            let text = fs::read_to_string(&table)
                .with_context(|| format!("read {}", table.display()))?;
            let dsv = read_dsv(&text).with_context(|| format!("parse table {}", table.display()))?;
            let errors = (!no_errors).then_some(error_column.as_str());
            let series = bar_series(&dsv, &value_column, &label_column, errors)
                .with_context(|| format!("select columns from {}", table.display()))?;
            if series.is_empty() {
                warn!("no rows left to plot in {}", table.display());
            }

            let pages = BarChartRenderer::new(settings.chart).render(&series)?;

            fs::create_dir_all(&settings.out_dir)
                .with_context(|| format!("create dir {}", settings.out_dir.display()))?;
            for page in &pages {
                let path = settings.out_dir.join(&page.file_name);
                atomic_write(&path, page.svg.as_bytes())?;
                println!("{}", path.display());
            }
            info!(pages = pages.len(), rows = series.len(), "chart written");
            Ok(())
        }
    }
}

fn load_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(load_config(explicit, &cwd)?)
}

fn read_reports(paths: &[PathBuf]) -> anyhow::Result<Vec<Report>> {
    paths.iter().map(|p| read_json(p)).collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let v =
        serde_json::from_slice(&bytes).with_context(|| format!("parse json {}", path.display()))?;
    Ok(v)
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    atomic_write(path, text.as_bytes())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = parent.to_path_buf();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4()));

    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create temp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
