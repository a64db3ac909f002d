//! Raw line → typed record normalization.

use crate::error::{PipelineError, Result, Source};
use crate::records::{CASE_SCHEMA, CaseRecord, RAINFALL_SCHEMA, RainfallRecord, SourceLine};

/// Splits a line on a literal delimiter. No quoting or escaping is honoured.
pub fn split_fields(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).collect()
}

/// Returns the `YYYY-MM` prefix of a dash-separated date.
///
/// Dates with fewer than two components come back as-is (`"2020"`, `""`);
/// the flatten step is where such keys get rejected.
pub fn derive_year_month(date: &str) -> String {
    date.split('-').take(2).collect::<Vec<_>>().join("-")
}

/// Parses a numeric field if it contains an ASCII digit, otherwise yields `0.0`.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedNumber`] if the value contains a digit
/// but is not a valid float (e.g. `"1x2"`).
pub fn coerce_number(value: &str, input: Source, line: usize) -> Result<f64> {
    if !value.bytes().any(|b| b.is_ascii_digit()) {
        return Ok(0.0);
    }

    value
        .trim()
        .parse::<f64>()
        .map_err(|_| PipelineError::MalformedNumber {
            input,
            line,
            value: value.to_string(),
        })
}

fn arity_error(fields: &[&str], schema: &[&str], input: Source, line: usize) -> PipelineError {
    PipelineError::FieldCount {
        input,
        line,
        expected: schema.len(),
        found: fields.len(),
    }
}

/// Maps positional case fields onto a [`CaseRecord`] and derives its `year_month`.
///
/// # Errors
///
/// Returns [`PipelineError::FieldCount`] unless there are exactly as many
/// fields as [`CASE_SCHEMA`] columns.
pub fn case_record(fields: &[&str], line: usize) -> Result<CaseRecord> {
    match fields {
        [
            id,
            date,
            case_count,
            region_code,
            city_code,
            region,
            postal_code,
            latitude,
            longitude,
        ] => Ok(CaseRecord {
            id: id.to_string(),
            date: date.to_string(),
            case_count: case_count.to_string(),
            region_code: region_code.to_string(),
            city_code: city_code.to_string(),
            region: region.to_string(),
            postal_code: postal_code.to_string(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            year_month: derive_year_month(date),
            line,
        }),
        _ => Err(arity_error(fields, &CASE_SCHEMA, Source::Cases, line)),
    }
}

/// Maps positional `(date, mm, uf)` fields onto a [`RainfallRecord`].
pub fn rainfall_record(fields: &[&str], line: usize) -> Result<RainfallRecord> {
    match fields {
        [date, millimeters, region] => Ok(RainfallRecord {
            date: date.to_string(),
            millimeters: millimeters.to_string(),
            region: region.to_string(),
            year_month: derive_year_month(date),
            line,
        }),
        _ => Err(arity_error(fields, &RAINFALL_SCHEMA, Source::Rainfall, line)),
    }
}

pub fn parse_case_line(line: &SourceLine, delimiter: char) -> Result<CaseRecord> {
    case_record(&split_fields(&line.text, delimiter), line.number)
}

pub fn parse_rainfall_line(line: &SourceLine, delimiter: char) -> Result<RainfallRecord> {
    rainfall_record(&split_fields(&line.text, delimiter), line.number)
}
