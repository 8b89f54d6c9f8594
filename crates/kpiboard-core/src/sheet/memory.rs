//! In-memory workbook.
//!
//! Cells live in a sparse `DashMap` keyed by position. Formulas are stored,
//! never evaluated: a formula cell displays its formula text.

use std::sync::Arc;

use dashmap::DashMap;
use kpiboard_engine::engine::{CellRange, CellRef, DisplayGrid};
use tracing::trace;

use super::{Sheet, Workbook};
use crate::error::{CoreError, Result};

/// What a cell holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellContent {
    Value(String),
    Formula(String),
}

impl CellContent {
    pub fn display(&self) -> &str {
        match self {
            CellContent::Value(v) => v,
            CellContent::Formula(f) => f,
        }
    }
}

/// A sheet stored in memory.
///
/// Clones share storage (the map is behind an `Arc`).
#[derive(Clone, Debug)]
pub struct MemorySheet {
    name: String,
    cells: Arc<DashMap<CellRef, CellContent>>,
}

impl MemorySheet {
    pub fn new(name: &str) -> Self {
        MemorySheet {
            name: name.to_string(),
            cells: Arc::new(DashMap::new()),
        }
    }

    /// Build a sheet from rows of display values starting at A1. Empty strings
    /// leave the cell empty.
    pub fn from_rows(name: &str, rows: &[Vec<String>]) -> Self {
        let sheet = MemorySheet::new(name);
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet
                        .cells
                        .insert(CellRef::new(c, r), CellContent::Value(value.clone()));
                }
            }
        }
        sheet
    }

    pub fn content(&self, cell: CellRef) -> Option<CellContent> {
        self.cells.get(&cell).map(|entry| entry.value().clone())
    }

    /// The formula at `cell`, if it holds one.
    pub fn formula(&self, cell: CellRef) -> Option<String> {
        match self.content(cell)? {
            CellContent::Formula(f) => Some(f),
            CellContent::Value(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl DisplayGrid for MemorySheet {
    fn display_value(&self, cell: CellRef) -> String {
        self.cells
            .get(&cell)
            .map(|entry| entry.value().display().to_string())
            .unwrap_or_default()
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, cell: CellRef, value: &str) -> Result<()> {
        trace!(sheet = %self.name, %cell, "set value");
        if value.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, CellContent::Value(value.to_string()));
        }
        Ok(())
    }

    fn set_formula(&mut self, cell: CellRef, formula: &str) -> Result<()> {
        if !formula.starts_with('=') {
            return Err(CoreError::Write {
                cell: cell.to_string(),
                message: format!("formula must start with '=': {}", formula),
            });
        }
        trace!(sheet = %self.name, %cell, formula, "set formula");
        self.cells
            .insert(cell, CellContent::Formula(formula.to_string()));
        Ok(())
    }

    fn clear_content(&mut self, range: CellRange) -> Result<()> {
        self.cells.retain(|cell, _| !range.contains(cell));
        Ok(())
    }

    fn used_range(&self) -> Option<CellRange> {
        let mut min_row = usize::MAX;
        let mut min_col = usize::MAX;
        let mut max_row = 0usize;
        let mut max_col = 0usize;

        for entry in self.cells.iter() {
            let cell = entry.key();
            min_row = min_row.min(cell.row);
            min_col = min_col.min(cell.col);
            max_row = max_row.max(cell.row);
            max_col = max_col.max(cell.col);
        }

        if min_row == usize::MAX {
            return None;
        }
        Some(CellRange::new(
            CellRef::new(min_col, min_row),
            CellRef::new(max_col, max_row),
        ))
    }
}

/// An ordered set of [`MemorySheet`]s.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet.
    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.retain(|s| s.name != sheet.name);
        self.sheets.push(sheet);
        self
    }

    /// Concrete access for callers that need [`MemorySheet`] helpers.
    pub fn memory_sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet(&self, name: &str) -> Option<&dyn Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s as &dyn Sheet)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| s as &mut dyn Sheet)
    }

    fn insert_sheet(&mut self, name: &str) -> Result<&mut dyn Sheet> {
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(CoreError::SheetExists(name.to_string()));
        }
        self.sheets.push(MemorySheet::new(name));
        let idx = self.sheets.len() - 1;
        Ok(&mut self.sheets[idx])
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}
