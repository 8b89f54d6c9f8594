//! Storage module for CSV import/export of sheets

mod csv;

pub use csv::{CsvMode, parse_csv, parse_csv_str, write_csv};
