//! Scan windows: immutable snapshots of display strings.

use super::cell_ref::CellRef;

/// Read access to display strings by cell position.
///
/// Positions outside the populated area read as empty strings.
pub trait DisplayGrid {
    fn display_value(&self, cell: CellRef) -> String;
}

impl<G: DisplayGrid + ?Sized> DisplayGrid for &G {
    fn display_value(&self, cell: CellRef) -> String {
        (**self).display_value(cell)
    }
}

/// A bounded `rows × cols` matrix of display strings, read once per locate pass.
///
/// Rows shorter than `cols` are padded with empty strings and longer rows are
/// truncated, so every row has exactly `cols` entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanWindow {
    values: Vec<Vec<String>>,
    rows: usize,
    cols: usize,
}

impl ScanWindow {
    pub fn new(mut values: Vec<Vec<String>>, rows: usize, cols: usize) -> Self {
        values.resize_with(rows, Vec::new);
        for row in &mut values {
            row.resize(cols, String::new());
        }
        ScanWindow { values, rows, cols }
    }

    /// Build a window sized to the given rows (widest row sets the width).
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let cols = values.iter().map(Vec::len).max().unwrap_or(0);
        let rows = values.len();
        ScanWindow::new(values, rows, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.values
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.values.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl DisplayGrid for ScanWindow {
    fn display_value(&self, cell: CellRef) -> String {
        self.get(cell.row, cell.col).to_string()
    }
}
