//! Output formatting and persistence.
//!
//! Renders joined rows as delimited text, writes the result file, lists
//! aggregates for inspection and appends run summaries to a CSV log.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use csv::WriterBuilder;
use tracing::{debug, info};

use crate::aggregators::Aggregate;
use crate::error::PipelineError;
use crate::records::JoinedRecord;
use crate::stats::RunSummary;

/// Fixed header of the result file.
pub const HEADER: &str = "UF;ANO;MES;DENGUE;CHUVA";

pub const HEADER_COLUMNS: [&str; 5] = ["UF", "ANO", "MES", "DENGUE", "CHUVA"];

pub const DEFAULT_DELIMITER: char = ';';

/// Header line for a given output delimiter; [`HEADER`] for the default one.
pub fn header(delimiter: char) -> String {
    format_row(&HEADER_COLUMNS, delimiter)
}

/// Renders a float the way a report reader expects: integral values keep a
/// trailing `.0`, everything else uses the shortest round-trip form.
///
/// Very large or small magnitudes switch to exponent form with a signed,
/// at least two-digit exponent (`1e+16`, `1.5e-05`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        return format!("{value:.1}");
    }

    let shortest = format!("{value:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}

impl JoinedRecord {
    /// Fields in output order: region, year, month, cases, rainfall.
    pub fn fields(&self) -> [String; 5] {
        [
            self.region.clone(),
            self.year.clone(),
            self.month.clone(),
            format_number(self.case_total),
            format_number(self.rainfall_total),
        ]
    }
}

/// Joins fields with `delimiter`. Embedded delimiters are not escaped.
pub fn format_row<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    let mut row = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            row.push(delimiter);
        }
        row.push_str(field.as_ref());
    }
    row
}

/// Writes `header` followed by one line per row, replacing any existing file.
///
/// Rows go to a hidden sibling file first and are renamed into place, so a
/// failed write never leaves a truncated result behind.
pub fn write_rows(path: &Path, header: &str, rows: &[String]) -> crate::error::Result<()> {
    let staging = staging_path(path);

    let written = write_lines(&staging, header, rows).and_then(|()| fs::rename(&staging, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&staging);
        return Err(PipelineError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(path = %path.display(), rows = rows.len(), "Result file written");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or(OsStr::new("output")));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_lines(path: &Path, header: &str, rows: &[String]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{header}")?;
    for row in rows {
        writeln!(writer, "{row}")?;
    }
    writer.flush()
}

/// Lists an aggregate in ascending key order, as `key;value` lines or a JSON object.
pub fn render_aggregate(aggregate: &Aggregate, json: bool) -> Result<String> {
    let sorted: BTreeMap<_, _> = aggregate.iter().collect();

    if json {
        return Ok(serde_json::to_string_pretty(&sorted)?);
    }

    let lines: Vec<String> = sorted
        .iter()
        .map(|(key, value)| {
            format_row(&[key.as_str(), format_number(**value).as_str()], DEFAULT_DELIMITER)
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Logs a run summary as pretty-printed JSON.
pub fn print_json(summary: &RunSummary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Appends a [`RunSummary`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending run summary");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on a fresh file
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CompositeKey;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10.0");
        assert_eq!(format_number(0.0), "0.0");
        assert_eq!(format_number(15.3), "15.3");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1234567.0), "1234567.0");
        assert_eq!(format_number(0.0001), "0.0001");
    }

    #[test]
    fn test_format_number_exponent_form() {
        assert_eq!(format_number(1e16), "1e+16");
        assert_eq!(format_number(1e-5), "1e-05");
        assert_eq!(format_number(1.5e-7), "1.5e-07");
        assert_eq!(format_number(2.5e100), "2.5e+100");
        assert_eq!(format_number(-1e-5), "-1e-05");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }

    #[test]
    fn test_format_row() {
        assert_eq!(format_row(&["SP", "2020", "03"], ';'), "SP;2020;03");
        assert_eq!(format_row(&["a;b", "c"], ';'), "a;b;c");
        assert_eq!(format_row::<&str>(&[], ';'), "");
    }

    #[test]
    fn test_joined_record_row() {
        let record = JoinedRecord {
            region: "SP".to_string(),
            year: "2020".to_string(),
            month: "03".to_string(),
            case_total: 10.0,
            rainfall_total: 15.0,
        };
        assert_eq!(
            format_row(&record.fields(), DEFAULT_DELIMITER),
            "SP;2020;03;10.0;15.0"
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(header(DEFAULT_DELIMITER), HEADER);
        assert_eq!(header(','), "UF,ANO,MES,DENGUE,CHUVA");
    }

    #[test]
    fn test_render_aggregate_sorted_lines() {
        let aggregate: Aggregate = [
            (CompositeKey::new("SP", "2020-04"), 2.0),
            (CompositeKey::new("RJ", "2020-03"), 1.5),
        ]
        .into_iter()
        .collect();

        let text = render_aggregate(&aggregate, false).unwrap();
        assert_eq!(text, "RJ-2020-03;1.5\nSP-2020-04;2.0");
    }

    #[test]
    fn test_render_aggregate_json() {
        let aggregate: Aggregate = [(CompositeKey::new("SP", "2020-03"), 10.0)]
            .into_iter()
            .collect();

        let text = render_aggregate(&aggregate, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["SP-2020-03"], 10.0);
    }

    #[test]
    fn test_write_rows() {
        let path = temp_path("dengue_chuva_test_rows.csv");
        let _ = fs::remove_file(&path);

        let rows = vec!["SP;2020;03;10.0;15.0".to_string()];
        write_rows(&path, HEADER, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "UF;ANO;MES;DENGUE;CHUVA\nSP;2020;03;10.0;15.0\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_rows_replaces_existing_file() {
        let path = temp_path("dengue_chuva_test_replace.csv");
        fs::write(&path, "stale\nstale\nstale\n").unwrap();

        write_rows(&path, HEADER, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "UF;ANO;MES;DENGUE;CHUVA\n");
        assert!(!staging_path(&path).exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_rows_failure_leaves_no_partial_file() {
        // A directory at the target path makes the final rename fail.
        let path = temp_path("dengue_chuva_test_target_is_dir");
        let _ = fs::remove_dir_all(&path);
        fs::create_dir(&path).unwrap();

        let rows = vec!["SP;2020;03;10.0;15.0".to_string()];
        let err = write_rows(&path, HEADER, &rows).unwrap_err();

        assert!(matches!(err, PipelineError::Io { .. }));
        assert!(path.is_dir());
        assert!(!staging_path(&path).exists());

        fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let staging = staging_path(Path::new("/data/resultado.csv"));
        assert_eq!(staging, Path::new("/data/.resultado.csv.tmp"));
    }

    #[test]
    fn test_write_rows_missing_dir() {
        let path = temp_path("dengue_chuva_missing_dir/out.csv");
        let err = write_rows(&path, HEADER, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&RunSummary::default()).unwrap();
    }

    #[test]
    fn test_append_summary_writes_header_once() {
        let path = temp_path("dengue_chuva_test_summary.csv");
        let _ = fs::remove_file(&path);

        let summary = RunSummary::default();
        append_summary(&path, &summary).unwrap();
        append_summary(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        let header_count = lines.iter().filter(|l| l.contains("started_at")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }
}
