//! Plain-text grid rendering.

use cellflow_core::Session;
use cellflow_engine::engine::CellRef;

const MAX_COLUMN_WIDTH: usize = 24;

/// Render every cell's display text as an aligned table with column letters
/// across the top and 1-based row numbers down the side.
pub fn render_table(session: &Session) -> String {
    let grid = session.grid();
    let row_header_width = grid.rows().to_string().len();

    let widths: Vec<usize> = (0..grid.cols())
        .map(|col| {
            let header = CellRef::col_to_letters(col).len();
            (0..grid.rows())
                .filter_map(|row| grid.display(&CellRef::new(row, col)).ok())
                .map(|text| text.chars().count())
                .fold(header, usize::max)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&" ".repeat(row_header_width));
    for (col, width) in widths.iter().enumerate() {
        out.push_str(&format!(" | {:<width$}", CellRef::col_to_letters(col), width = width));
    }
    out.push('\n');

    for row in 0..grid.rows() {
        out.push_str(&format!("{:>w$}", row + 1, w = row_header_width));
        for (col, width) in widths.iter().enumerate() {
            let text = grid.display(&CellRef::new(row, col)).unwrap_or_default();
            out.push_str(&format!(" | {:<width$}", truncate(text, *width), width = width));
        }
        out.push('\n');
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_small_grid() {
        let mut session = Session::new(2, 2);
        session.set_cell_label("A1", "3").unwrap();
        session.set_cell_label("B2", "=A1*10").unwrap();

        assert_eq!(render_table(&session), "  | A | B \n1 | 3 |   \n2 |   | 30\n");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdef", 4), "abc~");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
