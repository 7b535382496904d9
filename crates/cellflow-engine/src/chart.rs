//! Chart snapshots.
//!
//! A [`ChartSnapshot`] is a read-only numeric view of the grid for the
//! charting collaborator: every cell's display text parsed as a float (0 on
//! failure) plus row and column labels. Frontends turn it into whatever
//! chart they draw; the engine only prepares the data.

use crate::engine::{CellRef, Grid, coerce_number};

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSnapshot {
    /// "Row 1", "Row 2", ...
    pub row_labels: Vec<String>,
    /// "A", "B", ...
    pub column_labels: Vec<String>,
    /// `values[row][col]`
    pub values: Vec<Vec<f64>>,
}

impl ChartSnapshot {
    pub fn from_grid(grid: &Grid) -> Self {
        let row_labels = (0..grid.rows()).map(|r| format!("Row {}", r + 1)).collect();
        let column_labels = (0..grid.cols()).map(CellRef::col_to_letters).collect();

        let mut values = vec![vec![0.0; grid.cols()]; grid.rows()];
        for (cell_ref, cell) in grid.iter() {
            values[cell_ref.row][cell_ref.col] = coerce_number(cell.display());
        }

        ChartSnapshot {
            row_labels,
            column_labels,
            values,
        }
    }

    /// Points `(row number, value)` for one column, or `None` past the last column.
    pub fn series(&self, col: usize) -> Option<Vec<(f32, f32)>> {
        if col >= self.column_labels.len() {
            return None;
        }
        Some(
            self.values
                .iter()
                .enumerate()
                .map(|(row, values)| ((row + 1) as f32, values[col] as f32))
                .collect(),
        )
    }

    /// Min and max over every value. Equal bounds are widened so an axis
    /// always has a non-zero span.
    pub fn value_range(&self) -> (f32, f32) {
        let (min, max) = self
            .values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        if !min.is_finite() || !max.is_finite() {
            return (0.0, 1.0);
        }
        if min == max {
            return (min as f32 - 1.0, max as f32 + 1.0);
        }
        (min as f32, max as f32)
    }
}
