//! Formula evaluation.
//!
//! A formula is `=NAME(args)` for a registered built-in, or otherwise an
//! arithmetic body. Arithmetic is evaluated by Rhai once aggregate calls and
//! cell references have been replaced with numbers, so the script engine
//! never sees the grid.

use rhai::{Dynamic, Engine, Scope};

use super::cell_ref::{CellRef, Range};
use super::error::{EngineError, Result};
use super::format::format_dynamic;
use super::grid::Grid;
use super::preprocess::{float_literal, replace_all_fallible, substitute_operands};
use crate::builtins::{self, BuiltinKind};

/// A single cell rewrite produced by a command built-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellEdit {
    pub cell: CellRef,
    pub content: String,
}

impl CellEdit {
    pub fn new(cell: CellRef, content: impl Into<String>) -> Self {
        CellEdit {
            cell,
            content: content.into(),
        }
    }
}

/// Command built-ins, with the arguments they ran with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Upper { range: Range },
    Lower { range: Range },
    RemoveDuplicates { range: Range },
    FindAndReplace {
        find: String,
        replace: String,
        range: Range,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Upper { .. } => "UPPER",
            Command::Lower { .. } => "LOWER",
            Command::RemoveDuplicates { .. } => "REMOVE_DUPLICATES",
            Command::FindAndReplace { .. } => "FIND_AND_REPLACE",
        }
    }
}

/// What evaluating a formula produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Display text of a value.
    Value(String),
    /// Cell rewrites the caller must apply.
    Edits { command: Command, edits: Vec<CellEdit> },
}

/// Names and descriptions of every built-in, in registry order.
pub fn functions() -> impl Iterator<Item = (&'static str, &'static str)> {
    builtins::BUILTINS.iter().map(|b| (b.name, b.description))
}

pub struct Evaluator {
    engine: Engine,
}

impl Evaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(64, 32);
        engine.set_max_operations(100_000);
        Evaluator { engine }
    }

    /// Evaluate formula text (leading `=` optional) against the grid.
    pub fn evaluate(&self, grid: &Grid, formula: &str) -> Result<Outcome> {
        let body = formula.strip_prefix('=').unwrap_or(formula).trim();
        if body.is_empty() {
            return Err(EngineError::parse("empty formula"));
        }

        if let Some((name, args)) = split_call(body) {
            let builtin =
                builtins::lookup(name).ok_or_else(|| EngineError::UnknownFunction(name.into()))?;
            return builtins::call(builtin, grid, &builtins::split_args(args));
        }

        self.evaluate_arithmetic(grid, body).map(Outcome::Value)
    }

    /// Evaluate the formula stored in a cell. Commands are rejected because
    /// cell content may not rewrite other cells.
    pub fn evaluate_cell(&self, grid: &Grid, formula: &str) -> Result<String> {
        match self.evaluate(grid, formula)? {
            Outcome::Value(value) => Ok(value),
            Outcome::Edits { command, .. } => Err(EngineError::parse(format!(
                "{} rewrites cells and can only be submitted from the formula bar",
                command.name()
            ))),
        }
    }

    fn evaluate_arithmetic(&self, grid: &Grid, body: &str) -> Result<String> {
        let body = replace_all_fallible(builtins::aggregate_call_re(), body, |caps| {
            let builtin = builtins::lookup(&caps[1])
                .ok_or_else(|| EngineError::UnknownFunction(caps[1].to_string()))?;
            let value = builtins::aggregate_value(builtin, grid, &builtins::split_args(&caps[2]))?;
            Ok(float_literal(value))
        })?;

        if let Some(caps) = builtins::call_name_re().captures(&body) {
            let name = &caps[1];
            return Err(match builtins::lookup(name) {
                Some(b) if b.kind != BuiltinKind::Aggregate => EngineError::parse(format!(
                    "{} cannot be used inside an expression",
                    b.name
                )),
                _ => EngineError::UnknownFunction(name.to_string()),
            });
        }

        let expr = substitute_operands(&body, |cell| grid.number(cell))?;
        // An overflowing aggregate is spliced in as one of these.
        let mut scope = Scope::new();
        scope.push_constant("inf", f64::INFINITY);
        scope.push_constant("nan", f64::NAN);
        let value = self
            .engine
            .eval_expression_with_scope::<Dynamic>(&mut scope, &expr)
            .map_err(|e| EngineError::parse(format!("cannot evaluate {:?}: {}", body, e)))?;
        Ok(format_dynamic(&value))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `NAME(args)` when the whole body is one call. The opening paren
/// must close at the very end, so `SUM(A1:A2)+SUM(B1:B2)` is not a call.
fn split_call(body: &str) -> Option<(&str, &str)> {
    let open = body.find('(')?;
    let name = body[..open].trim();
    let valid_name = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name || !body.ends_with(')') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in body.char_indices().skip_while(|(i, _)| *i < open) {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return (idx == body.len() - 1).then(|| (name, &body[open + 1..idx]));
                    }
                }
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cells: &[(&str, &str)]) -> Grid {
        let mut grid = Grid::new(10, 10);
        for (label, text) in cells {
            grid.set(&label.parse().unwrap(), *text).unwrap();
        }
        grid
    }

    fn eval(grid: &Grid, formula: &str) -> Result<String> {
        Evaluator::new().evaluate_cell(grid, formula)
    }

    #[test]
    fn test_split_call() {
        assert_eq!(split_call("SUM(A1:B2)"), Some(("SUM", "A1:B2")));
        assert_eq!(split_call("SUM(A1:A2)+SUM(B1:B2)"), None);
        assert_eq!(split_call("(A1+1)"), None);
        assert_eq!(
            split_call("FIND_AND_REPLACE(\")\", \"(\", A1:A1)"),
            Some(("FIND_AND_REPLACE", "\")\", \"(\", A1:A1"))
        );
    }

    #[test]
    fn test_arithmetic_substitutes_references() {
        let grid = grid_with(&[("A1", "3"), ("B1", "abc")]);
        assert_eq!(eval(&grid, "=A1+1").unwrap(), "4");
        assert_eq!(eval(&grid, "=B1*2+C9").unwrap(), "0");
        assert_eq!(eval(&grid, "=7/2").unwrap(), "3.5");
    }

    #[test]
    fn test_arithmetic_with_embedded_aggregate() {
        let grid = grid_with(&[("A1", "1"), ("A2", "2"), ("A3", "3")]);
        assert_eq!(eval(&grid, "=SUM(A1:A3)*2").unwrap(), "12");
        assert_eq!(eval(&grid, "=average(A1:A3) - A1").unwrap(), "1");
    }

    #[test]
    fn test_overflowing_aggregate_inside_arithmetic() {
        let grid = grid_with(&[("A1", "1e308"), ("A2", "1e308")]);
        assert_eq!(eval(&grid, "=SUM(A1:A2)*2").unwrap(), "#INF!");
        assert_eq!(eval(&grid, "=1-SUM(A1:A2)").unwrap(), "#INF!");
        assert_eq!(eval(&grid, "=SUM(A1:A2)*0").unwrap(), "#NAN!");
    }

    #[test]
    fn test_exponent_literals() {
        let grid = grid_with(&[]);
        assert_eq!(eval(&grid, "=1.5e3").unwrap(), "1500");
        assert_eq!(eval(&grid, "=5E-1*4").unwrap(), "2");
    }

    #[test]
    fn test_function_names_are_case_insensitive() {
        let grid = grid_with(&[("A1", "1"), ("A2", "2")]);
        assert_eq!(eval(&grid, "=sum(A1:A2)").unwrap(), "3");
        assert_eq!(eval(&grid, "=Max(A1:A2)").unwrap(), "2");
    }

    #[test]
    fn test_unknown_function() {
        let grid = grid_with(&[]);
        assert_eq!(
            eval(&grid, "=VLOOKUP(A1:A2)").unwrap_err(),
            EngineError::UnknownFunction("VLOOKUP".to_string())
        );
        assert_eq!(
            eval(&grid, "=1+FOO(A1)").unwrap_err(),
            EngineError::UnknownFunction("FOO".to_string())
        );
    }

    #[test]
    fn test_command_cannot_be_cell_content() {
        let grid = grid_with(&[("A1", "x")]);
        assert!(matches!(
            eval(&grid, "=UPPER(A1:A1)"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            eval(&grid, "=1+TRIM(A1)"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_reference_outside_grid() {
        let grid = grid_with(&[]);
        assert!(matches!(
            eval(&grid, "=K1+1"),
            Err(EngineError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_malformed_expression_is_parse_error() {
        let grid = grid_with(&[]);
        assert!(matches!(eval(&grid, "=A1+"), Err(EngineError::Parse(_))));
        assert!(matches!(eval(&grid, "="), Err(EngineError::Parse(_))));
    }

    #[test]
    fn test_command_outcome() {
        let grid = grid_with(&[("A1", "xx")]);
        let outcome = Evaluator::new()
            .evaluate(&grid, "=FIND_AND_REPLACE(\"x\", \"y\", A1:A1)")
            .unwrap();
        let Outcome::Edits { command, edits } = outcome else {
            panic!("expected edits");
        };
        assert_eq!(command.name(), "FIND_AND_REPLACE");
        assert_eq!(edits, vec![CellEdit::new("A1".parse().unwrap(), "yy")]);
    }
}
