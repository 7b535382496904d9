//! Fixed-size grid store.
//!
//! Each cell owns its raw text. A cell whose text starts with `=` is a formula
//! cell; its last evaluated result is kept next to the text as the display
//! value. Nothing here triggers recalculation.

use super::cell_ref::{CellRef, Range};
use super::error::{EngineError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    content: String,
    computed: Option<String>,
}

impl Cell {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_formula(&self) -> bool {
        self.content.starts_with('=')
    }

    /// Text shown to the user and read by other formulas.
    pub fn display(&self) -> &str {
        if self.is_formula() {
            self.computed.as_deref().unwrap_or("")
        } else {
            &self.content
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Fail with `OutOfBounds` unless `cell` lies inside the grid.
    pub fn check(&self, cell: &CellRef) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds {
                cell: cell.to_string(),
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn check_range(&self, range: &Range) -> Result<()> {
        self.check(&range.start)?;
        self.check(&range.end)
    }

    fn index(&self, cell: &CellRef) -> Result<usize> {
        self.check(cell)?;
        Ok(cell.row * self.cols + cell.col)
    }

    pub fn cell(&self, cell: &CellRef) -> Result<&Cell> {
        let idx = self.index(cell)?;
        Ok(&self.cells[idx])
    }

    /// Raw content (formula text for formula cells).
    pub fn get(&self, cell: &CellRef) -> Result<&str> {
        Ok(self.cell(cell)?.content())
    }

    pub fn set(&mut self, cell: &CellRef, content: impl Into<String>) -> Result<()> {
        let idx = self.index(cell)?;
        self.cells[idx] = Cell {
            content: content.into(),
            computed: None,
        };
        Ok(())
    }

    pub fn is_formula(&self, cell: &CellRef) -> Result<bool> {
        Ok(self.cell(cell)?.is_formula())
    }

    pub fn display(&self, cell: &CellRef) -> Result<&str> {
        Ok(self.cell(cell)?.display())
    }

    /// Record the evaluated result of a formula cell.
    pub fn set_computed(&mut self, cell: &CellRef, value: impl Into<String>) -> Result<()> {
        let idx = self.index(cell)?;
        self.cells[idx].computed = Some(value.into());
        Ok(())
    }

    /// Numeric view of a cell's display text (0 when it does not parse).
    pub fn number(&self, cell: &CellRef) -> Result<f64> {
        Ok(coerce_number(self.display(cell)?))
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (CellRef::new(idx / cols, idx % cols), cell))
    }

    pub fn formula_cells(&self) -> impl Iterator<Item = (CellRef, &str)> {
        self.iter()
            .filter(|(_, cell)| cell.is_formula())
            .map(|(cell_ref, cell)| (cell_ref, cell.content()))
    }

    /// Contents as a rectangle of rows (empty string for empty cells).
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.cells
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|c| c.content.clone()).collect())
            .collect()
    }
}

/// Parse trimmed text as a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric coercion used by aggregates and arithmetic: failures become 0.
pub fn coerce_number(text: &str) -> f64 {
    parse_number(text).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_out_of_bounds_is_rejected() {
        let mut grid = Grid::new(2, 2);
        let err = grid.set(&CellRef::new(2, 0), "x").unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { .. }));
        assert!(grid.iter().all(|(_, c)| c.content().is_empty()));
    }

    #[test]
    fn test_formula_flag_follows_content() {
        let mut grid = Grid::new(1, 2);
        let a1 = CellRef::new(0, 0);
        grid.set(&a1, "=B1+1").unwrap();
        assert!(grid.is_formula(&a1).unwrap());
        grid.set(&a1, "12").unwrap();
        assert!(!grid.is_formula(&a1).unwrap());
    }

    #[test]
    fn test_display_of_formula_uses_computed_value() {
        let mut grid = Grid::new(1, 1);
        let a1 = CellRef::new(0, 0);
        grid.set(&a1, "=1+1").unwrap();
        assert_eq!(grid.display(&a1).unwrap(), "");
        grid.set_computed(&a1, "2").unwrap();
        assert_eq!(grid.display(&a1).unwrap(), "2");
        assert_eq!(grid.get(&a1).unwrap(), "=1+1");

        // Overwriting drops the stale result.
        grid.set(&a1, "=5").unwrap();
        assert_eq!(grid.display(&a1).unwrap(), "");
    }

    #[test]
    fn test_clear_resets_every_cell() {
        let mut grid = Grid::new(2, 3);
        grid.set(&CellRef::new(1, 2), "x").unwrap();
        grid.clear();
        assert_eq!(grid.to_rows(), vec![vec![String::new(); 3]; 2]);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(" 5 "), 5.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("-2.5"), Some(-2.5));
    }
}
