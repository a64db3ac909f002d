//! Typed records flowing between the pipeline stages.

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Column order of the case input.
pub const CASE_SCHEMA: [&str; 9] = [
    "id",
    "data_iniSE",
    "casos",
    "ibge_code",
    "cidade",
    "uf",
    "cep",
    "latitude",
    "longitude",
];

/// Column order of the rainfall input.
pub const RAINFALL_SCHEMA: [&str; 3] = ["data", "mm", "uf"];

/// One raw input line with its 1-based position in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    /// Numbers header-skipped lines starting at file line 2.
    pub fn numbered<I, S>(lines: I) -> Vec<SourceLine>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines
            .into_iter()
            .enumerate()
            .map(|(idx, text)| SourceLine {
                number: idx + 2,
                text: text.into(),
            })
            .collect()
    }
}

/// A reported-cases row, named after the `|`-delimited case schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    pub id: String,
    pub date: String,
    /// Raw count, possibly non-numeric (e.g. `"-"` for no report).
    pub case_count: String,
    pub region_code: String,
    pub city_code: String,
    /// State abbreviation (`uf`); the grouping and join region.
    pub region: String,
    pub postal_code: String,
    pub latitude: String,
    pub longitude: String,
    /// `YYYY-MM` prefix of `date`, set on construction.
    pub year_month: String,
    /// Source line, kept for error reporting.
    #[serde(skip)]
    pub line: usize,
}

/// A rainfall measurement row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallRecord {
    pub date: String,
    pub millimeters: String,
    pub region: String,
    pub year_month: String,
    #[serde(skip)]
    pub line: usize,
}

/// Join key shared by both sources, formatted `"{region}-{year}-{month}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new(region: &str, year_month: &str) -> Self {
        CompositeKey(format!("{region}-{year_month}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into `(region, year, month)`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedKey`] unless the key has exactly three
    /// dash-separated parts, which rules out regions containing `-` and
    /// dates that did not yield a full `YYYY-MM`.
    pub fn split_parts(&self) -> Result<(&str, &str, &str)> {
        let parts: Vec<&str> = self.0.split('-').collect();
        match parts.as_slice() {
            [region, year, month] => Ok((*region, *year, *month)),
            _ => Err(PipelineError::MalformedKey {
                key: self.0.clone(),
                parts: parts.len(),
            }),
        }
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key present in both aggregates, flattened for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub region: String,
    pub year: String,
    pub month: String,
    pub case_total: f64,
    pub rainfall_total: f64,
}
