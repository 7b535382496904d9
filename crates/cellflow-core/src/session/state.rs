use crate::config::SessionConfig;
use crate::error::Result;
use crate::notify::{Notification, Subscriber};
use cellflow_engine::engine::{CellRef, DependencyGraph, Evaluator, Grid};
use std::path::{Path, PathBuf};

/// UI-agnostic spreadsheet session.
///
/// Owns the grid store and the dependency graph exclusively; every mutation
/// goes through the operations on this type and runs to completion before
/// the next one starts.
pub struct Session {
    /// Fixed-size cell store
    pub(crate) grid: Grid,
    /// Source cell -> cells whose formulas read it
    pub(crate) graph: DependencyGraph,
    /// Formula evaluator (holds the Rhai engine used for arithmetic)
    pub(crate) evaluator: Evaluator,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified since the last save/load
    pub modified: bool,
    subscribers: Vec<Box<dyn Subscriber>>,
    /// Notifications of the operation in flight, delivered on commit
    pending: Vec<Notification>,
}

impl Session {
    /// Create an empty session with the given dimensions.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(rows: usize, cols: usize) -> Self {
        Session {
            grid: Grid::new(rows, cols),
            graph: DependencyGraph::new(),
            evaluator: Evaluator::new(),
            file_path: None,
            modified: false,
            subscribers: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn with_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.rows, config.cols))
    }

    /// Create a session and load a file if it exists.
    pub fn with_file(config: &SessionConfig, path: Option<&Path>) -> Result<Self> {
        let mut session = Self::with_config(config)?;
        if let Some(p) = path {
            if p.exists() {
                session.load_file(p)?;
            } else {
                session.file_path = Some(p.to_path_buf());
            }
        }
        Ok(session)
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Raw content of a cell (formula text for formula cells).
    pub fn content(&self, cell: &CellRef) -> Result<&str> {
        Ok(self.grid.get(cell)?)
    }

    /// Display text of a cell (evaluated result for formula cells).
    pub fn display(&self, cell: &CellRef) -> Result<&str> {
        Ok(self.grid.display(cell)?)
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Queue a notification for delivery when the current transaction commits.
    pub(crate) fn emit(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    /// Deliver a notification to every subscriber right away.
    pub(crate) fn notify(&mut self, notification: Notification) {
        for subscriber in &mut self.subscribers {
            subscriber.notify(&notification);
        }
    }

    /// Run `op` atomically: on error the grid and graph are restored and
    /// its notifications are dropped; on success they are delivered.
    pub(crate) fn transaction<T>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let grid = self.grid.clone();
        let graph = self.graph.clone();
        self.pending.clear();

        match op(self) {
            Ok(value) => {
                for notification in std::mem::take(&mut self.pending) {
                    self.notify(notification);
                }
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation = name, error = %err, "operation rejected");
                self.grid = grid;
                self.graph = graph;
                self.pending.clear();
                Err(err)
            }
        }
    }
}
