//! Stage wiring: normalize → aggregate → join → format.
//!
//! Every stage is a plain function over owned or borrowed collections, so a
//! run is just a call to [`run`] with the two sets of header-skipped lines.

use rayon::prelude::*;
use tracing::info;

use crate::aggregators::Aggregate;
use crate::aggregators::cases::aggregate_cases;
use crate::aggregators::rainfall::aggregate_rainfall;
use crate::error::Result;
use crate::join::reconcile;
use crate::normalize::{parse_case_line, parse_rainfall_line};
use crate::output::{DEFAULT_DELIMITER, format_row, header};
use crate::records::{CaseRecord, RainfallRecord, SourceLine};
use crate::stats::RunSummary;

pub const DEFAULT_CASE_DELIMITER: char = '|';
pub const DEFAULT_RAINFALL_DELIMITER: char = ',';

/// Field delimiters for the two inputs and the result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub case_delimiter: char,
    pub rainfall_delimiter: char,
    pub output_delimiter: char,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            case_delimiter: DEFAULT_CASE_DELIMITER,
            rainfall_delimiter: DEFAULT_RAINFALL_DELIMITER,
            output_delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Everything the sink needs: the header, formatted rows and run counters.
#[derive(Debug)]
pub struct PipelineOutput {
    pub header: String,
    pub rows: Vec<String>,
    pub summary: RunSummary,
}

pub fn normalize_cases(lines: &[SourceLine], delimiter: char) -> Result<Vec<CaseRecord>> {
    lines
        .par_iter()
        .map(|line| parse_case_line(line, delimiter))
        .collect()
}

pub fn normalize_rainfall(lines: &[SourceLine], delimiter: char) -> Result<Vec<RainfallRecord>> {
    lines
        .par_iter()
        .map(|line| parse_rainfall_line(line, delimiter))
        .collect()
}

/// Per-key case totals straight from raw lines.
pub fn case_totals(lines: &[SourceLine], config: &PipelineConfig) -> Result<Aggregate> {
    aggregate_cases(normalize_cases(lines, config.case_delimiter)?)
}

/// Per-key rounded rainfall totals straight from raw lines.
pub fn rainfall_totals(lines: &[SourceLine], config: &PipelineConfig) -> Result<Aggregate> {
    aggregate_rainfall(normalize_rainfall(lines, config.rainfall_delimiter)?)
}

/// Runs the whole pipeline over both inputs.
///
/// # Errors
///
/// Any fatal record error (wrong arity, malformed number, malformed key)
/// aborts the run; no rows are returned in that case.
#[tracing::instrument(skip_all, fields(case_lines = case_lines.len(), rainfall_lines = rainfall_lines.len()))]
pub fn run(
    case_lines: &[SourceLine],
    rainfall_lines: &[SourceLine],
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let mut summary = RunSummary::started_now();

    let cases = normalize_cases(case_lines, config.case_delimiter)?;
    let rainfall = normalize_rainfall(rainfall_lines, config.rainfall_delimiter)?;
    summary.case_records = cases.len();
    summary.rainfall_records = rainfall.len();

    let case_totals = aggregate_cases(cases)?;
    let rainfall_totals = aggregate_rainfall(rainfall)?;
    summary.case_keys = case_totals.len();
    summary.rainfall_keys = rainfall_totals.len();

    let joined = reconcile(&case_totals, &rainfall_totals)?;
    summary.joined_rows = joined.rows.len();
    summary.dropped_keys = joined.dropped_keys;

    let rows = joined
        .rows
        .iter()
        .map(|record| format_row(&record.fields(), config.output_delimiter))
        .collect();

    info!(
        rows = summary.joined_rows,
        match_pct = summary.match_pct(),
        "Pipeline finished"
    );

    Ok(PipelineOutput {
        header: header(config.output_delimiter),
        rows,
        summary,
    })
}
