//! Recalculation engine API.
//!
//! This module provides the pure computation layer of the spreadsheet:
//!
//! - [`CellRef`], [`Range`] - Label codec (A1 notation ↔ row/col indices)
//! - [`Grid`], [`Cell`] - Fixed-size grid store
//! - [`DependencyGraph`] - Source → dependents edges with cycle rejection
//! - [`extract_references`], [`extract_dependencies`] - What a formula reads
//! - [`shift_references_in_formula`] - Relative-reference translation for fills
//! - [`Evaluator`] - Built-in functions and Rhai-backed arithmetic
//! - [`format_number`] - Display formatting for results

mod cell_ref;
mod cycle;
pub(crate) mod deps;
mod error;
mod eval;
mod format;
mod graph;
mod grid;
mod preprocess;

pub use cell_ref::{CellRef, Range, column_to_index, format_label, index_to_column, parse_label};
pub use cycle::find_path;
pub use deps::{extract_dependencies, extract_references};
pub use error::{EngineError, Result};
pub use eval::{CellEdit, Command, Evaluator, Outcome, functions};
pub use format::{format_dynamic, format_number};
pub use graph::DependencyGraph;
pub use grid::{Cell, Grid, coerce_number, parse_number};
pub use preprocess::{shift_references_in_formula, substitute_operands};
