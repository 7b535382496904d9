use super::Session;
use crate::error::{Result, SheetError};
use crate::notify::Notification;
use cellflow_engine::engine::{
    CellRef, Command, EngineError, Outcome, Range, extract_references,
    shift_references_in_formula,
};
use std::collections::BTreeSet;

/// Result of a formula-bar submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaOutcome {
    /// The formula produced a value; no cell was written.
    Value(String),
    /// A command rewrote `changed` cells.
    Applied { command: Command, changed: usize },
}

impl FormulaOutcome {
    /// User-facing message for the formula bar.
    pub fn message(&self) -> String {
        match self {
            FormulaOutcome::Value(value) => format!("Result: {}", value),
            FormulaOutcome::Applied { command, .. } => match command {
                Command::Upper { .. } => "Applied UPPERCASE transformation.".to_string(),
                Command::Lower { .. } => "Applied lowercase transformation.".to_string(),
                Command::RemoveDuplicates { .. } => {
                    "Removed duplicates in the selected range.".to_string()
                }
                Command::FindAndReplace {
                    find,
                    replace,
                    range,
                } => format!("Replaced '{}' with '{}' in range {}.", find, replace, range),
            },
        }
    }
}

impl Session {
    /// Set a cell's content and propagate to everything that reads it.
    ///
    /// Content starting with `=` is a formula: its references are extracted,
    /// bounds-checked and registered (rejecting cycles) and it is evaluated.
    /// Any failure leaves the session untouched.
    pub fn set_cell(&mut self, cell: CellRef, content: &str) -> Result<()> {
        self.transaction("set_cell", |session| {
            session.store(cell, content)?;
            session.propagate(&[cell])?;
            session.modified = true;
            Ok(())
        })
    }

    /// [`Session::set_cell`] addressed by label, e.g. `"B12"`.
    pub fn set_cell_label(&mut self, label: &str, content: &str) -> Result<()> {
        let cell: CellRef = label.parse()?;
        self.set_cell(cell, content)
    }

    /// Copy `anchor` into every other cell of `range`.
    ///
    /// Formulas have their references shifted by each target's offset from
    /// the anchor; literals are copied verbatim. Returns the number of cells
    /// written.
    pub fn fill(&mut self, anchor: CellRef, range: Range) -> Result<usize> {
        self.transaction("fill", |session| {
            session.grid.check(&anchor)?;
            session.grid.check_range(&range)?;

            let source = session.grid.get(&anchor)?.to_string();
            let is_formula = source.starts_with('=');
            let mut written = Vec::new();

            for target in range.cells() {
                if target == anchor {
                    continue;
                }
                let content = if is_formula {
                    shift_references_in_formula(
                        &source,
                        target.row as isize - anchor.row as isize,
                        target.col as isize - anchor.col as isize,
                    )?
                } else {
                    source.clone()
                };
                session.store(target, &content)?;
                written.push(target);
            }

            session.propagate(&written)?;
            if !written.is_empty() {
                session.modified = true;
            }
            tracing::debug!(anchor = %anchor, range = %range, cells = written.len(), "fill");
            Ok(written.len())
        })
    }

    /// Empty every cell and reset the dependency graph.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.graph.clear();
        self.modified = true;
        self.notify(Notification::GridReplaced {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        });
    }

    /// Evaluate a formula typed into the formula bar.
    ///
    /// Value formulas report their result without writing anywhere. Command
    /// built-ins (UPPER, LOWER, REMOVE_DUPLICATES, FIND_AND_REPLACE) apply
    /// their rewrites to the grid and propagate them.
    pub fn submit_formula(&mut self, text: &str) -> Result<FormulaOutcome> {
        let text = text.trim();
        if !text.starts_with('=') {
            return Err(SheetError::Engine(EngineError::Parse(
                "formula must start with '='".to_string(),
            )));
        }

        self.transaction("submit_formula", |session| {
            match session.evaluator.evaluate(&session.grid, text)? {
                Outcome::Value(value) => Ok(FormulaOutcome::Value(value)),
                Outcome::Edits { command, edits } => {
                    let mut changed = Vec::with_capacity(edits.len());
                    for edit in edits {
                        session.store(edit.cell, &edit.content)?;
                        changed.push(edit.cell);
                    }
                    session.propagate(&changed)?;
                    if !changed.is_empty() {
                        session.modified = true;
                    }
                    Ok(FormulaOutcome::Applied {
                        command,
                        changed: changed.len(),
                    })
                }
            }
        })
    }

    /// Write content into the grid and rewire the cell's dependency edges.
    /// Evaluation is left to the propagation pass that follows.
    pub(crate) fn store(&mut self, cell: CellRef, content: &str) -> Result<()> {
        self.grid.check(&cell)?;
        if content.starts_with('=') {
            let refs = extract_references(content)?;
            for range in &refs {
                self.grid.check_range(range)?;
            }
            let deps: BTreeSet<CellRef> = refs.iter().flat_map(Range::cells).collect();
            self.graph.replace_dependencies(cell, &deps)?;
        } else {
            self.graph.remove_dependencies_of(&cell);
        }
        self.grid.set(&cell, content)?;
        Ok(())
    }
}
