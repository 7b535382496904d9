//! Error taxonomy for engine operations.
//!
//! Every failure is local to one operation (an edit, a fill, a formula
//! submission). Callers reject the triggering write when one of these is
//! returned, so none of them carry partial state.

use thiserror::Error;

use super::cell_ref::CellRef;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Cell {cell} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        cell: String,
        rows: usize,
        cols: usize,
    },

    #[error("Circular dependency: {dependent} cannot depend on {precedent}")]
    CyclicDependency {
        precedent: CellRef,
        dependent: CellRef,
    },
}

impl EngineError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
