//! cellflow-core - UI-agnostic session model + storage.

pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod storage;

pub use config::SessionConfig;
pub use error::{Result, SheetError};
pub use notify::{Notification, Recorder, Subscriber};
pub use session::{FormulaOutcome, Session};

pub use cellflow_engine::engine::{CellRef, Range};
