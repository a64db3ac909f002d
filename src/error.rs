//! Fatal pipeline errors.
//!
//! Recoverable anomalies (a numeric field with no digit, a negative rainfall
//! reading) are corrected in place by the aggregators and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// Identifies which input a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cases,
    Rainfall,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Cases => f.write_str("cases"),
            Source::Rainfall => f.write_str("rainfall"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{input} line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        input: Source,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{input} line {line}: malformed number {value:?}")]
    MalformedNumber {
        input: Source,
        line: usize,
        value: String,
    },

    #[error("composite key {key:?} splits into {parts} parts, expected 3 (region-year-month)")]
    MalformedKey { key: String, parts: usize },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
