//! CLI entry point for the dengue / rainfall monthly join.
//!
//! Provides subcommands for running the full join and for listing the
//! per-key aggregate of either input on its own.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dengue_chuva::{
    output::{append_summary, print_json, render_aggregate, write_rows},
    pipeline::{self, PipelineConfig, case_totals, rainfall_totals},
    source::read_lines,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "dengue_chuva")]
#[command(about = "Join monthly dengue case counts with rainfall per state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join both inputs and write the result file
    Run {
        /// Case input (`|`-delimited, header on first line)
        #[arg(short, long, default_value = "casos_dengue.txt")]
        cases: PathBuf,

        /// Rainfall input (`,`-delimited, header on first line)
        #[arg(short, long, default_value = "chuvas.csv")]
        rainfall: PathBuf,

        /// Result file, overwritten on success
        #[arg(short, long, default_value = "resultado.csv")]
        output: PathBuf,

        #[arg(long, default_value_t = pipeline::DEFAULT_CASE_DELIMITER)]
        case_delimiter: char,

        #[arg(long, default_value_t = pipeline::DEFAULT_RAINFALL_DELIMITER)]
        rainfall_delimiter: char,

        #[arg(long, default_value_t = dengue_chuva::output::DEFAULT_DELIMITER)]
        output_delimiter: char,

        /// Optional: CSV file to append a run summary row to
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print per-key case totals
    Cases {
        #[arg(short, long, default_value = "casos_dengue.txt")]
        input: PathBuf,

        #[arg(short, long, default_value_t = pipeline::DEFAULT_CASE_DELIMITER)]
        delimiter: char,

        /// Print a JSON object instead of `key;value` lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print per-key rainfall totals (rounded to one decimal)
    Rainfall {
        #[arg(short, long, default_value = "chuvas.csv")]
        input: PathBuf,

        #[arg(short, long, default_value_t = pipeline::DEFAULT_RAINFALL_DELIMITER)]
        delimiter: char,

        /// Print a JSON object instead of `key;value` lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Dropped on return, which flushes the JSON log file.
    let _file_guard = init_tracing();

    let cli = Cli::parse();

    report(execute(cli.command))
}

/// Logs a failed run before handing the error back to `main`.
fn report(result: Result<()>) -> Result<()> {
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Run failed");
    }
    result
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/dengue_chuva.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("dengue_chuva.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

/// Reads `var` as a filter, falling back to `default` when it is unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            cases,
            rainfall,
            output,
            case_delimiter,
            rainfall_delimiter,
            output_delimiter,
            summary,
        } => {
            let config = PipelineConfig {
                case_delimiter,
                rainfall_delimiter,
                output_delimiter,
            };
            run(&cases, &rainfall, &output, &config, summary.as_deref())?;
        }
        Commands::Cases {
            input,
            delimiter,
            json,
        } => {
            let config = PipelineConfig {
                case_delimiter: delimiter,
                ..Default::default()
            };
            let lines = read_lines(&input)?;
            let totals = case_totals(&lines, &config)?;
            info!(keys = totals.len(), "Case totals");
            println!("{}", render_aggregate(&totals, json)?);
        }
        Commands::Rainfall {
            input,
            delimiter,
            json,
        } => {
            let config = PipelineConfig {
                rainfall_delimiter: delimiter,
                ..Default::default()
            };
            let lines = read_lines(&input)?;
            let totals = rainfall_totals(&lines, &config)?;
            info!(keys = totals.len(), "Rainfall totals");
            println!("{}", render_aggregate(&totals, json)?);
        }
    }

    Ok(())
}

/// Runs the join and only touches the result file once every row is ready.
#[tracing::instrument(
    skip_all,
    fields(cases = %cases.display(), rainfall = %rainfall.display(), output = %output.display())
)]
fn run(
    cases: &Path,
    rainfall: &Path,
    output: &Path,
    config: &PipelineConfig,
    summary_path: Option<&Path>,
) -> Result<()> {
    let case_lines = read_lines(cases)?;
    let rainfall_lines = read_lines(rainfall)?;

    let result = pipeline::run(&case_lines, &rainfall_lines, config)
        .context("pipeline aborted, no output written")?;

    write_rows(output, &result.header, &result.rows)?;
    print_json(&result.summary)?;

    if let Some(path) = summary_path {
        append_summary(path, &result.summary)
            .with_context(|| format!("appending run summary to {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_report_failure_reaches_json_log_once_guard_drops() {
        let path = std::env::temp_dir().join("dengue_chuva_test_report.log");
        let _ = fs::remove_file(&path);

        let file = fs::File::create(&path).unwrap();
        let (writer, guard) = tracing_appender::non_blocking(file);
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(writer)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            report(Err(anyhow::anyhow!("cases line 3: malformed number \"1x2\"")))
        });
        drop(guard);

        assert!(result.is_err());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Run failed"));
        assert!(content.contains("ERROR"));
        assert!(content.contains("malformed number"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_report_success_passes_through() {
        assert!(report(Ok(())).is_ok());
    }
}
