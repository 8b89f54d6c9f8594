//! Spreadsheet capability interface.
//!
//! The builder only ever needs three things from a spreadsheet: read display
//! strings, set a value, set a formula. [`Sheet`] and [`Workbook`] capture
//! exactly that so the locator and emitter run the same against a remote
//! spreadsheet adapter or the in-memory [`MemoryWorkbook`].

mod memory;

pub use memory::{CellContent, MemorySheet, MemoryWorkbook};

use crate::error::Result;
use kpiboard_engine::engine::{CellRange, CellRef, DisplayGrid, ScanWindow};

/// One sheet of a workbook.
pub trait Sheet: DisplayGrid {
    fn name(&self) -> &str;

    fn set_value(&mut self, cell: CellRef, value: &str) -> Result<()>;

    /// Overwrites whatever the cell held before.
    fn set_formula(&mut self, cell: CellRef, formula: &str) -> Result<()>;

    fn clear_content(&mut self, range: CellRange) -> Result<()>;

    /// Smallest range covering every non-empty cell.
    fn used_range(&self) -> Option<CellRange>;

    /// Snapshot of the top-left `rows × cols` display strings.
    fn read_window(&self, rows: usize, cols: usize) -> ScanWindow {
        let values = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| self.display_value(CellRef::new(col, row)))
                    .collect()
            })
            .collect();
        ScanWindow::new(values, rows, cols)
    }

    /// Display strings of `range`, row-major.
    fn read_range(&self, range: CellRange) -> Vec<Vec<String>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.display_value(CellRef::new(col, row)))
                    .collect()
            })
            .collect()
    }

    fn set_values(&mut self, top_left: CellRef, rows: &[Vec<String>]) -> Result<()> {
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                self.set_value(top_left.offset(r, c), value)?;
            }
        }
        Ok(())
    }
}

/// A collection of named sheets.
pub trait Workbook {
    fn sheet(&self, name: &str) -> Option<&dyn Sheet>;

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn Sheet>;

    fn insert_sheet(&mut self, name: &str) -> Result<&mut dyn Sheet>;

    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }
}
