//! cellflow_engine - Spreadsheet recalculation engine.

pub(crate) mod builtins;
pub mod chart;
pub mod engine;
