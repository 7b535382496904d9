//! Dependency extraction from formula strings.
//!
//! Finds every cell a formula reads so the dependency graph can be kept in
//! step with stored formulas.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Ranges: `SUM(A1:B5)` contributes every cell of the rectangle
//! - Ignores references inside string literals (`"A1"`, `'A1'`)

use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::cell_ref::{CellRef, Range, parse_label};
use super::error::Result;

/// Matches a reference token or a range of two tokens.
///
/// Captures:
/// - group 1: first (or only) label
/// - group 2: second label when the token is a range
pub fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+[0-9]+)(?::([A-Z]+[0-9]+))?\b")
            .expect("reference regex must compile")
    })
}

/// The range a [`reference_re`] match denotes; a lone label is a 1x1 range.
pub(crate) fn reference_range(caps: &Captures) -> Result<Range> {
    let first = parse_label(&caps[1])?;
    match caps.get(2) {
        Some(second) => Ok(Range::new(first, parse_label(second.as_str())?)),
        None => Ok(Range::single(first)),
    }
}

/// Every reference a formula reads, as written. Ranges are not expanded, so
/// callers can bounds-check the corners before walking any cells.
pub fn extract_references(formula: &str) -> Result<Vec<Range>> {
    let script = strip_string_literals(formula);
    reference_re()
        .captures_iter(&script)
        .map(|caps| reference_range(&caps))
        .collect()
}

/// Extract all cells read by a formula. Malformed labels (e.g. `A0`) fail.
pub fn extract_dependencies(formula: &str) -> Result<BTreeSet<CellRef>> {
    Ok(extract_references(formula)?
        .iter()
        .flat_map(Range::cells)
        .collect())
}

/// Blank out the contents of quoted strings so references inside them are not seen.
pub(crate) fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in script.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }

    out
}
