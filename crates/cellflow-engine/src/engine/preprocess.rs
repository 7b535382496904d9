//! Formula text rewriting.
//!
//! - **Reference shifting**: `=A1+B2` copied two rows down and three columns
//!   right becomes `=D3+E5` (relative references only).
//! - **Substitution**: before an arithmetic body is handed to Rhai, every
//!   reference becomes the numeric value of that cell and every numeric
//!   literal becomes a float literal, so `7/2` is `3.5` rather than integer
//!   division.
//!
//! Text inside string literals is never rewritten.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::{CellRef, parse_label};
use super::error::Result;

fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]+[0-9]+\b").expect("cell token regex must compile"))
}

fn operand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?<cell>[A-Z]+[0-9]+)\b|\b(?<num>[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?)\b|(?<frac>\.[0-9]+(?:[eE][+-]?[0-9]+)?)\b",
        )
        .expect("operand regex must compile")
    })
}

/// Rewrite every reference token by adding (`row_delta`, `col_delta`).
///
/// Each token is decoded, shifted and re-encoded independently. A token that
/// would land before row 1 or column A fails with `Parse`.
pub fn shift_references_in_formula(
    formula: &str,
    row_delta: isize,
    col_delta: isize,
) -> Result<String> {
    if row_delta == 0 && col_delta == 0 {
        return Ok(formula.to_string());
    }

    rewrite_outside_strings(formula, |seg| {
        replace_all_fallible(cell_token_re(), seg, |caps| {
            let cell = parse_label(&caps[0])?;
            Ok(cell.offset(row_delta, col_delta)?.to_string())
        })
    })
}

/// Replace references with the value `lookup` returns and numeric literals
/// with float literals.
pub fn substitute_operands<F>(body: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&CellRef) -> Result<f64>,
{
    rewrite_outside_strings(body, |seg| {
        replace_all_fallible(operand_re(), seg, |caps| {
            if let Some(cell) = caps.name("cell") {
                let value = lookup(&parse_label(cell.as_str())?)?;
                return Ok(float_literal(value));
            }
            let literal = caps
                .name("num")
                .or_else(|| caps.name("frac"))
                .map(|m| m.as_str())
                .unwrap_or_default();
            Ok(float_literal(literal.parse::<f64>().unwrap_or(0.0)))
        })
    })
}

/// Render a number as a Rhai float literal (`3.0`, `(-2.5)`, `1.0e20`).
/// Non-finite values become the `inf` and `nan` constants the evaluator
/// puts in scope.
pub(crate) fn float_literal(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "(-inf)" }.to_string();
    }
    let mut text = format!("{:?}", n);
    if let Some(pos) = text.find('e')
        && !text[..pos].contains('.')
    {
        text.insert_str(pos, ".0");
    }
    if n.is_sign_negative() {
        format!("({})", text)
    } else {
        text
    }
}

pub(crate) fn replace_all_fallible<F>(re: &Regex, text: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&Captures) -> Result<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replace(&caps)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Apply `rewrite` to every segment outside of `"..."` / `'...'` literals.
fn rewrite_outside_strings<F>(script: &str, mut rewrite: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut seg_start = 0;
    let mut quote: Option<u8> = None;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == q && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                quote = None;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' || b == b'\'' {
            out.push_str(&rewrite(&script[seg_start..i])?);
            quote = Some(b);
            seg_start = i;
            backslashes = 0;
        }
        i += 1;
    }

    if seg_start < script.len() {
        if quote.is_some() {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&rewrite(&script[seg_start..])?);
        }
    }

    Ok(out)
}
