//! Table location over a scan window.
//!
//! A table is found in up to three steps:
//!
//! 1. **Anchor**: the first cell (row-major) whose normalized text equals the
//!    normalized title. Skipped for headerless specs.
//! 2. **Header row**: the first row, within a neighborhood of the anchor (or the
//!    whole window when there is no title), where every required header is a
//!    substring of some normalized cell. The column of the first required
//!    header's first match becomes the table's key column.
//! 3. **Bounds**: walk down the key column from the row under the header until
//!    the first empty cell or the depth limit; the width is fixed by the spec.
//!
//! All comparisons go through [`normalize`]. Nothing here errors: a miss is a
//! value ([`Located::NotFound`]).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cell_ref::{CellRange, CellRef};
use super::normalize::normalize;
use super::scan::{DisplayGrid, ScanWindow};

/// Rows below the anchor searched for the header row (inclusive of the anchor row).
pub const HEADER_ROW_WINDOW: usize = 15;
/// Columns right of the anchor searched for header cells.
pub const HEADER_COL_WINDOW: usize = 25;
/// Maximum number of data rows walked below a header row.
pub const DEFAULT_MAX_DOWN: usize = 300;

/// Number of columns a table spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableWidth {
    Two,
    Three,
    Four,
}

impl TableWidth {
    /// Width implied by a required-header count (4+ -> 4, 3 -> 3, otherwise 2).
    pub fn for_header_count(n: usize) -> TableWidth {
        match n {
            0..=2 => TableWidth::Two,
            3 => TableWidth::Three,
            _ => TableWidth::Four,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            TableWidth::Two => 2,
            TableWidth::Three => 3,
            TableWidth::Four => 4,
        }
    }
}

/// Row and key column of a matched header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderMatch {
    pub row: usize,
    pub col: usize,
}

impl HeaderMatch {
    pub fn cell(&self) -> CellRef {
        CellRef::new(self.col, self.row)
    }
}

/// Rectangle of a detected table: header row through last data row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableBounds {
    pub header_row: usize,
    pub header_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl TableBounds {
    pub fn range(&self) -> CellRange {
        CellRange::new(
            CellRef::new(self.header_col, self.header_row),
            CellRef::new(self.last_col, self.last_row),
        )
    }

    /// Data rows under the header (zero for a header-only table).
    pub fn data_rows(&self) -> usize {
        self.last_row - self.header_row
    }
}

/// What to look for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Title cell text; `None` searches for the header row anywhere.
    pub title: Option<String>,
    /// Required header substrings, in order. The first one anchors the key column.
    pub headers: Vec<String>,
    pub width: TableWidth,
    pub max_down: usize,
}

impl TableSpec {
    /// A table found under a title cell.
    pub fn titled(title: &str, headers: &[&str]) -> Self {
        TableSpec {
            title: Some(title.to_string()),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            width: TableWidth::for_header_count(headers.len()),
            max_down: DEFAULT_MAX_DOWN,
        }
    }

    /// A table found by its header row alone.
    pub fn by_headers(headers: &[&str]) -> Self {
        TableSpec {
            title: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            width: TableWidth::for_header_count(headers.len()),
            max_down: DEFAULT_MAX_DOWN,
        }
    }

    pub fn with_width(mut self, width: TableWidth) -> Self {
        self.width = width;
        self
    }

    pub fn with_max_down(mut self, max_down: usize) -> Self {
        self.max_down = max_down;
        self
    }
}

/// Why a table was not found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Miss {
    /// No cell matched the title.
    Anchor,
    /// No row in range carried every required header.
    HeaderRow,
}

/// Outcome of [`locate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Located {
    Found(TableBounds),
    NotFound(Miss),
}

impl Located {
    pub fn found(self) -> Option<TableBounds> {
        match self {
            Located::Found(bounds) => Some(bounds),
            Located::NotFound(_) => None,
        }
    }
}

/// First cell (row-major) whose normalized text equals the normalized title.
pub fn find_anchor(window: &ScanWindow, title: &str) -> Option<CellRef> {
    let needle = normalize(title);
    for row in 0..window.rows() {
        for col in 0..window.cols() {
            if normalize(window.get(row, col)) == needle {
                return Some(CellRef::new(col, row));
            }
        }
    }
    None
}

/// Find the header row in the `row_window` rows and `col_window` columns
/// starting at `anchor` (both inclusive of the anchor itself).
pub fn find_header_near(
    window: &ScanWindow,
    anchor: CellRef,
    headers: &[String],
    row_window: usize,
    col_window: usize,
) -> Option<HeaderMatch> {
    if window.rows() == 0 || window.cols() == 0 {
        return None;
    }
    let end_row = (anchor.row + row_window).min(window.rows() - 1);
    let end_col = (anchor.col + col_window).min(window.cols() - 1);
    find_header_in(window, headers, anchor.row..=end_row, anchor.col, end_col)
}

/// Find the header row anywhere in the window.
pub fn find_header_anywhere(window: &ScanWindow, headers: &[String]) -> Option<HeaderMatch> {
    if window.rows() == 0 || window.cols() == 0 {
        return None;
    }
    find_header_in(window, headers, 0..=window.rows() - 1, 0, window.cols() - 1)
}

fn find_header_in(
    window: &ScanWindow,
    headers: &[String],
    rows: std::ops::RangeInclusive<usize>,
    start_col: usize,
    end_col: usize,
) -> Option<HeaderMatch> {
    let wanted: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let first = wanted.first()?;
    if start_col > end_col {
        return None;
    }

    for row in rows {
        let cells: Vec<String> = (start_col..=end_col)
            .map(|col| normalize(window.get(row, col)))
            .collect();
        let all_present = wanted
            .iter()
            .all(|w| cells.iter().any(|cell| cell.contains(w.as_str())));
        if all_present {
            let offset = cells
                .iter()
                .position(|cell| cell.contains(first.as_str()))
                .unwrap_or(0);
            return Some(HeaderMatch {
                row,
                col: start_col + offset,
            });
        }
    }
    None
}

/// Walk down the key column under `header` until the first empty cell or
/// `max_down` rows, whichever comes first.
///
/// Reads through [`DisplayGrid`] so the walk may extend past the scan window
/// when the grid is a live sheet.
pub fn detect_bounds<G: DisplayGrid + ?Sized>(
    grid: &G,
    header: HeaderMatch,
    width: TableWidth,
    max_down: usize,
) -> TableBounds {
    let mut last_row = header.row;
    for i in 1..=max_down {
        let cell = header.cell().offset(i, 0);
        if normalize(&grid.display_value(cell)).is_empty() {
            break;
        }
        last_row = cell.row;
    }

    TableBounds {
        header_row: header.row,
        header_col: header.col,
        last_row,
        last_col: header.col + width.columns() - 1,
    }
}

/// Locate a table described by `spec`. `grid` backs the downward bounds walk.
pub fn locate<G: DisplayGrid + ?Sized>(spec: &TableSpec, window: &ScanWindow, grid: &G) -> Located {
    let header = match spec.title.as_deref() {
        Some(title) => {
            let Some(anchor) = find_anchor(window, title) else {
                debug!(title, "table title not found");
                return Located::NotFound(Miss::Anchor);
            };
            find_header_near(
                window,
                anchor,
                &spec.headers,
                HEADER_ROW_WINDOW,
                HEADER_COL_WINDOW,
            )
        }
        None => find_header_anywhere(window, &spec.headers),
    };

    let Some(header) = header else {
        debug!(title = ?spec.title, headers = ?spec.headers, "header row not found");
        return Located::NotFound(Miss::HeaderRow);
    };

    let bounds = detect_bounds(grid, header, spec.width, spec.max_down);
    debug!(range = %bounds.range(), "table located");
    Located::Found(bounds)
}
