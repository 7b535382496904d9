//! Change notifications for rendering collaborators.
//!
//! A session buffers notifications while an operation runs and delivers
//! them only once it commits, so a subscriber never sees a rejected edit.

use std::cell::RefCell;
use std::rc::Rc;

use cellflow_engine::engine::CellRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A cell's display text changed (edit, fill, command or recalculation).
    CellChanged { cell: CellRef, display: String },
    /// The whole grid was replaced (import) or cleared.
    GridReplaced { rows: usize, cols: usize },
}

pub trait Subscriber {
    fn notify(&mut self, notification: &Notification);
}

impl<F> Subscriber for F
where
    F: FnMut(&Notification),
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Subscriber that keeps every notification. Clones share one log.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Labels of changed cells, in delivery order.
    pub fn changed_labels(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::CellChanged { cell, .. } => Some(cell.to_string()),
                Notification::GridReplaced { .. } => None,
            })
            .collect()
    }
}

impl Subscriber for Recorder {
    fn notify(&mut self, notification: &Notification) {
        self.log.borrow_mut().push(notification.clone());
    }
}
