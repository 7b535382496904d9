//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Names are ALL CAPS in the registry and matched case-insensitively.
//! - Aggregates read a range and yield a number. They can be stored in cells
//!   and embedded in arithmetic (`=SUM(A1:A3)*2`).
//! - TRIM yields text.
//! - Commands rewrite cells in a range. They never run as cell content; the
//!   evaluator returns their edits and the session applies them.
//! - If you add a built-in, list it in `BUILTINS` and dispatch it in `call`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::engine::deps::{reference_range, reference_re};
use crate::engine::{
    CellEdit, CellRef, Command, EngineError, Grid, Outcome, Range, Result, format_number,
    parse_label, parse_number,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinKind {
    Aggregate,
    Text,
    Command,
}

pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub arity: usize,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        kind: BuiltinKind::Aggregate,
        arity: 1,
        description: "Sum of the cells in a range (non-numeric cells count as 0)",
    },
    Builtin {
        name: "AVERAGE",
        kind: BuiltinKind::Aggregate,
        arity: 1,
        description: "Sum divided by the number of cells in the range",
    },
    Builtin {
        name: "MAX",
        kind: BuiltinKind::Aggregate,
        arity: 1,
        description: "Largest value in a range",
    },
    Builtin {
        name: "MIN",
        kind: BuiltinKind::Aggregate,
        arity: 1,
        description: "Smallest value in a range",
    },
    Builtin {
        name: "COUNT",
        kind: BuiltinKind::Aggregate,
        arity: 1,
        description: "Number of cells holding a finite number",
    },
    Builtin {
        name: "TRIM",
        kind: BuiltinKind::Text,
        arity: 1,
        description: "Cell text (or a quoted string) without surrounding whitespace",
    },
    Builtin {
        name: "UPPER",
        kind: BuiltinKind::Command,
        arity: 1,
        description: "Upper-case every cell in a range",
    },
    Builtin {
        name: "LOWER",
        kind: BuiltinKind::Command,
        arity: 1,
        description: "Lower-case every cell in a range",
    },
    Builtin {
        name: "REMOVE_DUPLICATES",
        kind: BuiltinKind::Command,
        arity: 1,
        description: "Clear rows of a range that repeat an earlier row",
    },
    Builtin {
        name: "FIND_AND_REPLACE",
        kind: BuiltinKind::Command,
        arity: 3,
        description: "Replace text in every cell of a range",
    },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

/// Regex that matches aggregate calls like `SUM(A1:B5)` inside an expression.
///
/// Captures:
/// - group 1: function name (any case)
/// - group 2: the raw argument list
pub fn aggregate_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = BUILTINS
            .iter()
            .filter(|b| b.kind == BuiltinKind::Aggregate)
            .map(|b| b.name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b({})\s*\(([^()]*)\)", names))
            .expect("aggregate call regex must compile")
    })
}

/// Regex that matches any remaining `NAME(` in an arithmetic body.
pub fn call_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("call name regex must compile")
    })
}

/// Dispatch a built-in with already split arguments.
pub(crate) fn call(builtin: &Builtin, grid: &Grid, args: &[String]) -> Result<Outcome> {
    check_arity(builtin, args)?;

    match builtin.kind {
        BuiltinKind::Aggregate => Ok(Outcome::Value(format_number(aggregate_value(
            builtin, grid, args,
        )?))),
        BuiltinKind::Text => Ok(Outcome::Value(trim(grid, &args[0])?)),
        BuiltinKind::Command => command(builtin.name, grid, args),
    }
}

fn check_arity(builtin: &Builtin, args: &[String]) -> Result<()> {
    if args.len() != builtin.arity {
        return Err(EngineError::ArgumentCount {
            function: builtin.name.to_string(),
            expected: builtin.arity,
            found: args.len(),
        });
    }
    Ok(())
}

/// Numeric result of an aggregate call, before display formatting.
pub(crate) fn aggregate_value(builtin: &Builtin, grid: &Grid, args: &[String]) -> Result<f64> {
    check_arity(builtin, args)?;
    let range = range_arg(grid, &args[0])?;
    aggregate(builtin.name, grid, &range)
}

fn command(name: &str, grid: &Grid, args: &[String]) -> Result<Outcome> {
    let (command, edits) = match name {
        "UPPER" => {
            let range = range_arg(grid, &args[0])?;
            (Command::Upper { range }, change_case(grid, &range, true)?)
        }
        "LOWER" => {
            let range = range_arg(grid, &args[0])?;
            (Command::Lower { range }, change_case(grid, &range, false)?)
        }
        "REMOVE_DUPLICATES" => {
            let range = range_arg(grid, &args[0])?;
            (
                Command::RemoveDuplicates { range },
                remove_duplicates(grid, &range)?,
            )
        }
        "FIND_AND_REPLACE" => {
            let find = quoted_arg(name, &args[0])?;
            let replace = quoted_arg(name, &args[1])?;
            if find.is_empty() {
                return Err(EngineError::parse("FIND_AND_REPLACE needs non-empty find text"));
            }
            let range = range_arg(grid, &args[2])?;
            let edits = find_and_replace(grid, &find, &replace, &range)?;
            (
                Command::FindAndReplace {
                    find,
                    replace,
                    range,
                },
                edits,
            )
        }
        other => return Err(EngineError::UnknownFunction(other.to_string())),
    };
    Ok(Outcome::Edits { command, edits })
}

/// Split an argument list on commas that are not inside quotes.
pub(crate) fn split_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in args.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                current.push(ch);
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                ',' => out.push(std::mem::take(&mut current).trim().to_string()),
                _ => current.push(ch),
            },
        }
    }
    out.push(current.trim().to_string());
    out
}

fn unquote(arg: &str) -> Option<&str> {
    let arg = arg.trim();
    for q in ['"', '\''] {
        if arg.len() >= 2 && arg.starts_with(q) && arg.ends_with(q) {
            return Some(&arg[1..arg.len() - 1]);
        }
    }
    None
}

fn quoted_arg(function: &str, arg: &str) -> Result<String> {
    unquote(arg).map(str::to_string).ok_or_else(|| {
        EngineError::parse(format!(
            "{} expects a quoted string, got {}",
            function, arg
        ))
    })
}

/// A range argument: exactly `A1:B5` or a single label. Anything else
/// (quoted, spaced around the colon) is a `Parse` error, so every range a
/// formula can read is one dependency extraction also sees.
pub(crate) fn range_arg(grid: &Grid, arg: &str) -> Result<Range> {
    let arg = arg.trim();
    let caps = reference_re()
        .captures(arg)
        .filter(|caps| caps.get(0).is_some_and(|m| m.as_str() == arg))
        .ok_or_else(|| {
            EngineError::parse(format!("expected a range like A1:B5, got {}", arg))
        })?;
    let range = reference_range(&caps)?;
    grid.check_range(&range)?;
    Ok(range)
}

pub(crate) fn aggregate(name: &str, grid: &Grid, range: &Range) -> Result<f64> {
    let values = range
        .cells()
        .map(|cell| grid.number(&cell))
        .collect::<Result<Vec<f64>>>()?;

    let value = match name {
        "SUM" => values.iter().sum(),
        "AVERAGE" => values.iter().sum::<f64>() / values.len() as f64,
        "MAX" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "MIN" => values.iter().copied().fold(f64::INFINITY, f64::min),
        "COUNT" => range
            .cells()
            .map(|cell| grid.display(&cell).map(|text| parse_number(text).is_some()))
            .collect::<Result<Vec<bool>>>()?
            .into_iter()
            .filter(|numeric| *numeric)
            .count() as f64,
        other => return Err(EngineError::UnknownFunction(other.to_string())),
    };
    Ok(value)
}

fn trim(grid: &Grid, arg: &str) -> Result<String> {
    if let Some(text) = unquote(arg) {
        return Ok(text.trim().to_string());
    }
    let cell = parse_label(arg.trim())?;
    Ok(grid.display(&cell)?.trim().to_string())
}

/// Literal cells only: a formula's text is not user data.
fn literal_cells<'a>(
    grid: &'a Grid,
    range: &Range,
) -> impl Iterator<Item = Result<(CellRef, &'a str)>> + use<'a> {
    range.cells().filter_map(move |cell| match grid.cell(&cell) {
        Ok(c) if c.is_formula() => None,
        Ok(c) => Some(Ok((cell, c.content()))),
        Err(err) => Some(Err(err)),
    })
}

fn change_case(grid: &Grid, range: &Range, upper: bool) -> Result<Vec<CellEdit>> {
    let mut edits = Vec::new();
    for entry in literal_cells(grid, range) {
        let (cell, text) = entry?;
        let changed = if upper {
            text.to_uppercase()
        } else {
            text.to_lowercase()
        };
        if changed != text {
            edits.push(CellEdit::new(cell, changed));
        }
    }
    Ok(edits)
}

fn remove_duplicates(grid: &Grid, range: &Range) -> Result<Vec<CellEdit>> {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut edits = Vec::new();

    for row in range.start.row..=range.end.row {
        let cells: Vec<CellRef> = (range.start.col..=range.end.col)
            .map(|col| CellRef::new(row, col))
            .collect();
        let key = cells
            .iter()
            .map(|cell| grid.display(cell).map(str::to_string))
            .collect::<Result<Vec<String>>>()?;

        if !seen.insert(key) {
            for cell in cells {
                if !grid.get(&cell)?.is_empty() {
                    edits.push(CellEdit::new(cell, String::new()));
                }
            }
        }
    }
    Ok(edits)
}

fn find_and_replace(
    grid: &Grid,
    find: &str,
    replace: &str,
    range: &Range,
) -> Result<Vec<CellEdit>> {
    let mut edits = Vec::new();
    for entry in literal_cells(grid, range) {
        let (cell, text) = entry?;
        if text.contains(find) {
            edits.push(CellEdit::new(cell, text.replace(find, replace)));
        }
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cells: &[(&str, &str)]) -> Grid {
        let mut grid = Grid::new(5, 3);
        for (label, text) in cells {
            grid.set(&label.parse().unwrap(), *text).unwrap();
        }
        grid
    }

    fn value(grid: &Grid, name: &str, arg: &str) -> String {
        match call(lookup(name).unwrap(), grid, &[arg.to_string()]).unwrap() {
            Outcome::Value(v) => v,
            Outcome::Edits { .. } => panic!("expected a value"),
        }
    }

    fn edits(grid: &Grid, name: &str, args: &[&str]) -> Vec<(String, String)> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        match call(lookup(name).unwrap(), grid, &args).unwrap() {
            Outcome::Edits { edits, .. } => edits
                .into_iter()
                .map(|e| (e.cell.to_string(), e.content))
                .collect(),
            Outcome::Value(_) => panic!("expected edits"),
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("sum").unwrap().name, "SUM");
        assert_eq!(lookup("Find_And_Replace").unwrap().arity, 3);
        assert!(lookup("VLOOKUP").is_none());
    }

    #[test]
    fn test_aggregates_over_single_cell() {
        let grid = grid_with(&[("A1", "5")]);
        assert_eq!(value(&grid, "SUM", "A1:A1"), "5");
        assert_eq!(value(&grid, "AVERAGE", "A1:A1"), "5");
        assert_eq!(value(&grid, "MAX", "A1:A1"), "5");
        assert_eq!(value(&grid, "MIN", "A1:A1"), "5");
        assert_eq!(value(&grid, "COUNT", "A1:A1"), "1");
    }

    #[test]
    fn test_average_counts_empty_cells() {
        let grid = grid_with(&[("A1", "4"), ("A2", "x"), ("A3", "")]);
        assert_eq!(value(&grid, "SUM", "A1:A3"), "4");
        assert_eq!(value(&grid, "AVERAGE", "A1:A4"), "1");
        assert_eq!(value(&grid, "COUNT", "A1:A3"), "1");
        assert_eq!(value(&grid, "MIN", "A1:A3"), "0");
    }

    #[test]
    fn test_range_outside_grid() {
        let grid = grid_with(&[]);
        let err = call(lookup("SUM").unwrap(), &grid, &["A1:Z1".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { .. }));
    }

    #[test]
    fn test_range_argument_must_be_bare() {
        let grid = grid_with(&[("A1", "1")]);
        assert_eq!(value(&grid, "SUM", "B2:A1"), "1");
        assert_eq!(value(&grid, "SUM", "A1"), "1");
        for arg in ["\"A1:A3\"", "A1 : A3", "'A1'", "A1:A3:A4", "a1:a3"] {
            let err = call(lookup("SUM").unwrap(), &grid, &[arg.to_string()]).unwrap_err();
            assert!(matches!(err, EngineError::Parse(_)), "{arg} should be rejected");
        }
    }

    #[test]
    fn test_trim_cell_and_literal() {
        let grid = grid_with(&[("B2", "  padded  ")]);
        assert_eq!(value(&grid, "TRIM", "B2"), "padded");
        assert_eq!(value(&grid, "TRIM", "\"  hi \""), "hi");
    }

    #[test]
    fn test_upper_and_lower_edit_changed_cells() {
        let grid = grid_with(&[("A1", "abc"), ("A2", "ABC"), ("A3", "=A1")]);
        assert_eq!(
            edits(&grid, "UPPER", &["A1:A3"]),
            vec![("A1".to_string(), "ABC".to_string())]
        );
        assert_eq!(
            edits(&grid, "LOWER", &["A1:A3"]),
            vec![("A2".to_string(), "abc".to_string())]
        );
    }

    #[test]
    fn test_remove_duplicates_clears_later_rows() {
        let grid = grid_with(&[
            ("A1", "x"),
            ("B1", "1"),
            ("A2", "y"),
            ("B2", "1"),
            ("A3", "x"),
            ("B3", "1"),
        ]);
        assert_eq!(
            edits(&grid, "REMOVE_DUPLICATES", &["A1:B3"]),
            vec![
                ("A3".to_string(), String::new()),
                ("B3".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_find_and_replace() {
        let grid = grid_with(&[("A1", "xx"), ("A2", "zz")]);
        assert_eq!(
            edits(&grid, "FIND_AND_REPLACE", &["\"x\"", "'y'", "A1:A2"]),
            vec![("A1".to_string(), "yy".to_string())]
        );
    }

    #[test]
    fn test_find_and_replace_arity() {
        let grid = grid_with(&[("A1", "xx")]);
        let err = call(
            lookup("FIND_AND_REPLACE").unwrap(),
            &grid,
            &["\"x\"".to_string(), "A1:A1".to_string()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::ArgumentCount {
                function: "FIND_AND_REPLACE".to_string(),
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn test_find_and_replace_requires_quotes() {
        let grid = grid_with(&[("A1", "xx")]);
        let args = ["x".to_string(), "\"y\"".to_string(), "A1:A1".to_string()];
        let err = call(lookup("FIND_AND_REPLACE").unwrap(), &grid, &args).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn test_split_args_respects_quotes() {
        assert_eq!(
            split_args("\"a,b\", 'c' , A1:B2"),
            vec!["\"a,b\"", "'c'", "A1:B2"]
        );
        assert!(split_args("  ").is_empty());
    }
}
