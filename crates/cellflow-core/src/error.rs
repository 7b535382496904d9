//! Error types for Cellflow core.

use cellflow_engine::engine::EngineError;
use thiserror::Error;

/// Errors that can occur while operating a session
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error at line {line}: {message}")]
    Import { line: usize, message: String },

    #[error("No file path set")]
    NoFilePath,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SheetError {
    /// The engine error behind this failure, if any.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            SheetError::Engine(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
