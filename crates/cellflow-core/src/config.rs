//! Session configuration.

use serde::Deserialize;

use crate::error::{Result, SheetError};

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 10;

/// Grid dimensions, fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

impl SessionConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        SessionConfig { rows, cols }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SheetError::Config(format!(
                "grid must have at least one row and column (got {}x{})",
                self.rows, self.cols
            )));
        }
        Ok(())
    }
}
