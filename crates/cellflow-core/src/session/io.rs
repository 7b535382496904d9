use super::Session;
use crate::error::{Result, SheetError};
use crate::notify::Notification;
use crate::storage::{read_rows, write_rows};
use cellflow_engine::engine::CellRef;
use std::path::{Path, PathBuf};

impl Session {
    /// Every cell's raw text, row-major, empty strings for empty cells.
    pub fn export_rows(&self) -> Vec<Vec<String>> {
        self.grid.to_rows()
    }

    /// Replace the whole grid with `rows`.
    ///
    /// Rows shorter than the grid (or fewer rows) are padded with empty
    /// cells; data past the grid's extent is `OutOfBounds`. The dependency
    /// graph is rebuilt from the formulas and every formula is recalculated.
    /// A cyclic or otherwise invalid sheet leaves the session unchanged.
    pub fn import_rows(&mut self, rows: Vec<Vec<String>>) -> Result<()> {
        self.transaction("import", |session| {
            for (r, row) in rows.iter().enumerate() {
                if let Some(last) = row.len().checked_sub(1) {
                    session.grid.check(&CellRef::new(r, last))?;
                }
            }

            session.grid.clear();
            session.graph.clear();
            for (r, row) in rows.iter().enumerate() {
                for (c, text) in row.iter().enumerate() {
                    if !text.is_empty() {
                        session.store(CellRef::new(r, c), text)?;
                    }
                }
            }

            session.recalculate_all()?;
            session.modified = true;
            let (rows, cols) = (session.grid.rows(), session.grid.cols());
            session.emit(Notification::GridReplaced { rows, cols });
            Ok(())
        })
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(SheetError::NoFilePath);
        };

        write_rows(path, &self.grid.to_rows())?;
        self.modified = false;
        Ok(path.clone())
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Load from file. `.csv` files are read as CSV, anything else as JSON.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let rows = read_rows(path)?;
        self.import_rows(rows)?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Recorder;
    use cellflow_engine::engine::EngineError;

    fn cell(label: &str) -> CellRef {
        label.parse().unwrap()
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cellflow_{}_{}_{:?}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
            name
        ))
    }

    struct Cleanup(PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_import_rebuilds_graph_and_recalculates() {
        let mut s = Session::new(3, 3);
        let rec = Recorder::new();
        s.subscribe(rec.clone());

        s.import_rows(rows(&[&["2", "=A1+1", "=B1*2"]])).unwrap();
        assert_eq!(s.display(&cell("B1")).unwrap(), "3");
        assert_eq!(s.display(&cell("C1")).unwrap(), "6");
        assert_eq!(rec.take(), vec![Notification::GridReplaced { rows: 3, cols: 3 }]);

        s.set_cell_label("A1", "10").unwrap();
        assert_eq!(s.display(&cell("C1")).unwrap(), "22");
    }

    #[test]
    fn test_import_replaces_previous_contents() {
        let mut s = Session::new(3, 3);
        s.set_cell_label("C3", "=A1").unwrap();
        s.import_rows(rows(&[&["1"]])).unwrap();
        assert_eq!(s.content(&cell("C3")).unwrap(), "");
        assert!(s.graph().is_empty());
    }

    #[test]
    fn test_cyclic_import_is_rejected() {
        let mut s = Session::new(3, 3);
        s.set_cell_label("A1", "keep").unwrap();
        let before = s.grid().clone();

        let err = s.import_rows(rows(&[&["=B1", "=A1"]])).unwrap_err();
        assert!(matches!(
            err.engine(),
            Some(EngineError::CyclicDependency { .. })
        ));
        assert_eq!(s.grid(), &before);
        assert!(s.graph().is_empty());
    }

    #[test]
    fn test_import_larger_than_grid_is_out_of_bounds() {
        let mut s = Session::new(2, 2);
        let err = s.import_rows(rows(&[&["1", "2", "3"]])).unwrap_err();
        assert!(matches!(err.engine(), Some(EngineError::OutOfBounds { .. })));
        let err = s.import_rows(rows(&[&["1"], &["2"], &["3"]])).unwrap_err();
        assert!(matches!(err.engine(), Some(EngineError::OutOfBounds { .. })));
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut s = Session::new(2, 2);
        assert!(matches!(s.save_file(), Err(SheetError::NoFilePath)));
    }

    #[test]
    fn test_json_save_and_load() {
        let path = temp_path("sheet.json");
        let _cleanup = Cleanup(path.clone());

        let mut s = Session::new(4, 4);
        s.set_cell_label("A1", "4").unwrap();
        s.set_cell_label("A2", "=A1*A1").unwrap();
        assert!(s.modified);
        s.save_as(&path).unwrap();
        assert!(!s.modified);

        let mut loaded = Session::new(4, 4);
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.content(&cell("A2")).unwrap(), "=A1*A1");
        assert_eq!(loaded.display(&cell("A2")).unwrap(), "16");
        assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
        assert!(!loaded.modified);
    }

    #[test]
    fn test_csv_save_and_load() {
        let path = temp_path("sheet.csv");
        let _cleanup = Cleanup(path.clone());

        let mut s = Session::new(3, 2);
        s.set_cell_label("A1", "a, b").unwrap();
        s.set_cell_label("B1", "=TRIM(A1)").unwrap();
        s.set_cell_label("A3", "7").unwrap();
        s.save_as(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("\"a, b\",=TRIM(A1)"));

        let mut loaded = Session::new(3, 2);
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.export_rows(), s.export_rows());
        assert_eq!(loaded.display(&cell("B1")).unwrap(), "a, b");
    }

    #[test]
    fn test_failed_load_keeps_session() {
        let path = temp_path("bad.json");
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, "not json").unwrap();

        let mut s = Session::new(2, 2);
        s.set_cell_label("A1", "1").unwrap();
        assert!(matches!(s.load_file(&path), Err(SheetError::Json(_))));
        assert_eq!(s.content(&cell("A1")).unwrap(), "1");
        assert!(s.file_path.is_none());
    }
}
