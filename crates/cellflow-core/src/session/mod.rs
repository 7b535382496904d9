//! Session state and logic (UI-agnostic).

mod io;
mod ops;
mod recalc;
mod state;

pub use ops::FormulaOutcome;
pub use state::Session;
