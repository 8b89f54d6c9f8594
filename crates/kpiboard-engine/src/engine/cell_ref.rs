//! Cell and range reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "D5:F30", "'01 DashBoard'!A1:B2") and zero-indexed
//! column/row coordinates.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?(?<letters>[A-Za-z]+)\$?(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// `$` absolute markers are accepted and ignored.
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name.trim())?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Absolute form, e.g. `$V$2`.
    pub fn to_absolute(&self) -> String {
        format!("${}${}", CellRef::col_to_letters(self.col), self.row + 1)
    }

    /// The cell `rows` below and `cols` right of this one.
    pub fn offset(&self, rows: usize, cols: usize) -> CellRef {
        CellRef::new(self.col + cols, self.row + rows)
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// An inclusive rectangle of cells. `start` is always the top-left corner.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build a range from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> CellRange {
        CellRange {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    /// Parse `"D5:F30"`. A bare cell (`"A1"`) is a one-cell range.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<CellRange> {
        match s.split_once(':') {
            Some((a, b)) => Some(CellRange::new(CellRef::from_str(a)?, CellRef::from_str(b)?)),
            None => CellRef::from_str(s).map(|c| CellRange::new(c, c)),
        }
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Number of cells covered. Saturates instead of overflowing.
    pub fn cell_count(&self) -> usize {
        self.rows().saturating_mul(self.cols())
    }
}

impl std::str::FromStr for CellRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellRange::from_str(s).ok_or_else(|| format!("Invalid range: {}", s))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A range qualified by its sheet, e.g. `API!A1:B20` or `'01 DashBoard'!D5:F30`.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetRange {
    pub sheet: String,
    pub range: CellRange,
}

impl SheetRange {
    pub fn new(sheet: impl Into<String>, range: CellRange) -> SheetRange {
        SheetRange {
            sheet: sheet.into(),
            range,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<SheetRange> {
        let (sheet, range) = s.rsplit_once('!')?;
        let sheet = unquote_sheet_name(sheet.trim())?;
        if sheet.is_empty() {
            return None;
        }
        Some(SheetRange::new(sheet, CellRange::from_str(range)?))
    }
}

impl std::str::FromStr for SheetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SheetRange::from_str(s).ok_or_else(|| format!("Invalid sheet range: {}", s))
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", quote_sheet_name(&self.sheet), self.range)
    }
}

/// Quote a sheet name for use in a reference when it is not a plain identifier.
/// Embedded single quotes are doubled.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn unquote_sheet_name(raw: &str) -> Option<String> {
    match raw.strip_prefix('\'') {
        Some(rest) => Some(rest.strip_suffix('\'')?.replace("''", "'")),
        None => Some(raw.to_string()),
    }
}
