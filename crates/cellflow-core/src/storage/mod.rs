//! Storage formats.
//!
//! A sheet is persisted as rows of raw cell text (formula text for formula
//! cells, empty strings for empty cells). The dependency graph is never
//! stored; it is rebuilt from the formulas on import.

mod csv;
mod json;

pub use csv::{parse_csv, write_csv};
pub use json::{parse_json, write_json};

use crate::error::{Result, SheetError};
use std::path::Path;

const MAX_SHEET_FILE_BYTES: u64 = 16 * 1_048_576; // 16 MiB

/// On-disk format, chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// `.csv` (any case) is CSV; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Json,
        }
    }
}

/// Read rows of cell text from `path`.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_SHEET_FILE_BYTES {
        return Err(SheetError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: sheet file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_SHEET_FILE_BYTES
            ),
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let rows = match Format::from_path(path) {
        Format::Json => parse_json(&content)?,
        Format::Csv => parse_csv(&content)?,
    };
    tracing::debug!(path = %path.display(), rows = rows.len(), "read sheet");
    Ok(rows)
}

/// Write rows of cell text to `path`.
pub fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let content = match Format::from_path(path) {
        Format::Json => write_json(rows)?,
        Format::Csv => write_csv(rows),
    };
    std::fs::write(path, content)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote sheet");
    Ok(())
}
