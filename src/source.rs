//! Line readers for the two inputs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::records::SourceLine;

/// Reads a text file, skipping its header line.
///
/// Lines keep their 1-based file position; `\n` and `\r\n` terminators are dropped.
pub fn read_lines(path: &Path) -> Result<Vec<SourceLine>> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let lines = parse_lines(reader).map_err(io_err)?;

    debug!(path = %path.display(), lines = lines.len(), "Input read");
    Ok(lines)
}

/// Splits buffered text into header-skipped [`SourceLine`]s.
///
/// Blank lines are kept; they fail the arity check downstream.
pub fn parse_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<SourceLine>> {
    let texts = reader
        .lines()
        .skip(1)
        .collect::<std::io::Result<Vec<String>>>()?;

    Ok(SourceLine::numbered(texts))
}
