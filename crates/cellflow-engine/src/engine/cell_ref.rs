//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet labels
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//! Columns use bijective base-26: `A` = 0 … `Z` = 25, `AA` = 26, `AB` = 27.
//!
//! # Examples
//!
//! ```
//! use cellflow_engine::engine::{CellRef, Range};
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!((cell.row, cell.col), (2, 1));
//! assert_eq!(cell.to_string(), "B3");
//!
//! let range = Range::parse("C4:A1").unwrap();
//! assert_eq!(range.to_string(), "A1:C4");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{EngineError, Result};

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Offset this reference by a signed delta.
    pub fn offset(&self, row_delta: isize, col_delta: isize) -> Result<CellRef> {
        let row = self.row as isize + row_delta;
        if row < 0 {
            return Err(EngineError::parse(format!(
                "row of {} shifted by {} is before row 1",
                self, row_delta
            )));
        }
        // Column letters are rebuilt through the codec so negative columns fail there.
        let letters = index_to_column(self.col as isize + col_delta)?;
        Ok(CellRef::new(row as usize, column_to_index(&letters)?))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<digits>[0-9]+)$").expect("label regex must compile")
    })
}

/// Decode column letters into a zero-based index (`A` -> 0, `AA` -> 26).
pub fn column_to_index(letters: &str) -> Result<usize> {
    if letters.is_empty() {
        return Err(EngineError::parse("column letters are empty"));
    }

    let mut acc = 0usize;
    for c in letters.bytes() {
        if !c.is_ascii_uppercase() {
            return Err(EngineError::parse(format!(
                "invalid column letters: {}",
                letters
            )));
        }
        let digit = (c - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| EngineError::parse(format!("column {} is too large", letters)))?;
    }
    Ok(acc - 1)
}

/// Encode a zero-based column index as letters. Negative indices are rejected.
pub fn index_to_column(index: isize) -> Result<String> {
    if index < 0 {
        return Err(EngineError::parse(format!(
            "column index {} is negative",
            index
        )));
    }
    Ok(CellRef::col_to_letters(index as usize))
}

/// Parse a label matching `[A-Z]+[0-9]+` into a [`CellRef`].
pub fn parse_label(label: &str) -> Result<CellRef> {
    let caps = label_re()
        .captures(label)
        .ok_or_else(|| EngineError::parse(format!("invalid cell label: {:?}", label)))?;

    let col = column_to_index(&caps["letters"])?;
    let row = caps["digits"]
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| EngineError::parse(format!("invalid row in label {}", label)))?;

    Ok(CellRef::new(row, col))
}

/// Inverse of [`parse_label`].
pub fn format_label(cell: &CellRef) -> String {
    cell.to_string()
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse_label(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular, inclusive span of cells. Always stored normalized:
/// `start` holds the minimum row/column and `end` the maximum.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Build a range from two corners given in any order.
    pub fn new(a: CellRef, b: CellRef) -> Range {
        Range {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn single(cell: CellRef) -> Range {
        Range::new(cell, cell)
    }

    /// Parse "A1:B5" (corners in either order).
    pub fn parse(text: &str) -> Result<Range> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 2 {
            return Err(EngineError::parse(format!("invalid range: {:?}", text)));
        }
        let a = parse_label(parts[0].trim())?;
        let b = parse_label(parts[1].trim())?;
        Ok(Range::new(a, b))
    }

    pub fn row_count(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn len(&self) -> usize {
        self.row_count() * self.col_count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + use<> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellRef::new(row, col)))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
