//! Grid engine API.
//!
//! Pure, I/O-free building blocks shared by the sheet builder and the dashboard:
//!
//! - [`CellRef`], [`CellRange`], [`SheetRange`] - A1 reference parsing and formatting
//! - [`normalize`] - Accent- and case-insensitive text folding
//! - [`ScanWindow`], [`DisplayGrid`] - Display-string snapshots and read access
//! - [`locate`] - Title/header based table detection

mod cell_ref;
mod locate;
mod normalize;
mod scan;

pub use cell_ref::{CellRange, CellRef, SheetRange, quote_sheet_name};
pub use locate::{
    DEFAULT_MAX_DOWN, HEADER_COL_WINDOW, HEADER_ROW_WINDOW, HeaderMatch, Located, Miss,
    TableBounds, TableSpec, TableWidth, detect_bounds, find_anchor, find_header_anywhere,
    find_header_near, locate,
};
pub use normalize::normalize;
pub use scan::{DisplayGrid, ScanWindow};
