//! CSV import/export of sheets

use crate::error::Result;
use crate::sheet::{MemorySheet, Sheet};
use kpiboard_engine::engine::{CellRange, CellRef};
use std::io::Write;
use std::path::Path;

/// How formula-looking values are exported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsvMode {
    /// Prefix values starting with `= + - @` with `'` so spreadsheet apps
    /// open them as text.
    Guarded,
    /// Write values verbatim (used to inspect emitted formulas).
    Raw,
}

/// Parse a CSV file into a sheet named `name`, starting at A1.
pub fn parse_csv(path: &Path, name: &str) -> Result<MemorySheet> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_csv_str(&content, name))
}

/// Parse CSV text into a sheet named `name`, starting at A1.
pub fn parse_csv_str(content: &str, name: &str) -> MemorySheet {
    MemorySheet::from_rows(name, &parse_csv_records(content))
}

/// Split CSV text into records. Quoted fields may span line breaks; a
/// trailing newline does not open an empty record.
pub(crate) fn parse_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = content.chars().peekable();

    fn finish_field(fields: &mut Vec<String>, current: &mut String, quoted: bool) {
        if quoted {
            fields.push(std::mem::take(current));
        } else {
            fields.push(current.trim().to_string());
            current.clear();
        }
    }

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    finish_field(&mut fields, &mut current, field_was_quoted);
                    field_was_quoted = false;
                }
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    finish_field(&mut fields, &mut current, field_was_quoted);
                    field_was_quoted = false;
                    records.push(std::mem::take(&mut fields));
                }
                _ => current.push(c),
            }
        }
    }
    if !current.is_empty() || !fields.is_empty() || field_was_quoted {
        finish_field(&mut fields, &mut current, field_was_quoted);
        records.push(fields);
    }
    records
}

/// Export display values of `sheet` to CSV. Without a range, the used range
/// is written starting from A1 so cell positions survive a re-import.
pub fn write_csv(
    path: &Path,
    sheet: &dyn Sheet,
    range: Option<CellRange>,
    mode: CsvMode,
) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    let range = match range {
        Some(range) => range,
        None => match sheet.used_range() {
            Some(used) => CellRange::new(CellRef::new(0, 0), used.end),
            None => return Ok(()),
        },
    };

    for row in sheet.read_range(range) {
        let fields: Vec<String> = row
            .iter()
            .map(|value| escape_csv_field(value, mode))
            .collect();
        writeln!(file, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str, mode: CsvMode) -> String {
    // Guard against CSV formula injection in spreadsheet apps.
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    let safe_field = if mode == CsvMode::Guarded && matches!(first_non_space, Some('=' | '+' | '-' | '@')) {
        format!("'{}", field)
    } else {
        field.to_string()
    };

    if safe_field.contains(',')
        || safe_field.contains('"')
        || safe_field.contains('\n')
        || safe_field.contains('\r')
    {
        format!("\"{}\"", safe_field.replace('"', "\"\""))
    } else {
        safe_field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpiboard_engine::engine::DisplayGrid;

    struct Cleanup(std::path::PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "kpiboard_{}_{}_{}_{:?}.csv",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
        ))
    }

    fn record(line: &str) -> Vec<String> {
        parse_csv_records(line).remove(0)
    }

    #[test]
    fn test_parse_csv_line_simple() {
        assert_eq!(record("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(
            record(r#"a,"hello, world",c"#),
            vec!["a", "hello, world", "c"]
        );
    }

    #[test]
    fn test_parse_csv_line_quoted_preserves_whitespace() {
        assert_eq!(
            record(r#""  keep me  ",x"#),
            vec!["  keep me  ", "x"]
        );
    }

    #[test]
    fn test_parse_csv_line_escaped_quotes() {
        assert_eq!(
            record(r#"a,"say ""hello""",c"#),
            vec!["a", r#"say "hello""#, "c"]
        );
    }

    #[test]
    fn test_parse_csv_quoted_newline_stays_in_field() {
        let sheet = parse_csv_str("\"Nota\nlarga\",x\nReporte TKC\n", "dash");
        assert_eq!(sheet.display_value(CellRef::new(0, 0)), "Nota\nlarga");
        assert_eq!(sheet.display_value(CellRef::new(1, 0)), "x");
        assert_eq!(sheet.display_value(CellRef::new(0, 1)), "Reporte TKC");
    }

    #[test]
    fn test_parse_csv_records_line_endings() {
        assert_eq!(
            parse_csv_records("a,b\r\n\r\nc\n"),
            vec![vec!["a", "b"], vec![""], vec!["c"]]
        );
        assert!(parse_csv_records("").is_empty());
    }

    #[test]
    fn test_parse_csv_str_positions() {
        let sheet = parse_csv_str(",Reporte TKC\n,Estado,Cantidad\n,Entregada,12", "dash");
        assert_eq!(sheet.display_value(CellRef::new(1, 0)), "Reporte TKC");
        assert_eq!(sheet.display_value(CellRef::new(2, 2)), "12");
        assert_eq!(sheet.display_value(CellRef::new(0, 0)), "");
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("simple", CsvMode::Guarded), "simple");
        assert_eq!(escape_csv_field("with,comma", CsvMode::Guarded), "\"with,comma\"");
        assert_eq!(escape_csv_field("with\"quote", CsvMode::Guarded), "\"with\"\"quote\"");
    }

    #[test]
    fn test_escape_csv_field_formula_injection_with_leading_whitespace() {
        assert_eq!(escape_csv_field(" =1+1", CsvMode::Guarded), "' =1+1");
        assert_eq!(escape_csv_field("\t-2+3", CsvMode::Guarded), "'\t-2+3");
        assert_eq!(escape_csv_field(" \t@cmd", CsvMode::Guarded), "' \t@cmd");
    }

    #[test]
    fn test_escape_csv_field_raw_keeps_formulas() {
        assert_eq!(escape_csv_field("=NOW()", CsvMode::Raw), "=NOW()");
        assert_eq!(
            escape_csv_field("=IFERROR(SUM($E$2:$E),0)", CsvMode::Raw),
            "\"=IFERROR(SUM($E$2:$E),0)\""
        );
    }

    #[test]
    fn test_write_csv_round_trips_positions() {
        let mut sheet = MemorySheet::new("API");
        sheet.set_value(CellRef::new(1, 1), "x, y").unwrap();
        sheet.set_formula(CellRef::new(2, 0), "=NOW()").unwrap();

        let path = temp_path("roundtrip");
        let _cleanup = Cleanup(path.clone());

        write_csv(&path, &sheet, None, CsvMode::Raw).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, ",,=NOW()\n,\"x, y\",\n");

        let back = parse_csv(&path, "API").unwrap();
        assert_eq!(back.display_value(CellRef::new(1, 1)), "x, y");
        assert_eq!(back.display_value(CellRef::new(2, 0)), "=NOW()");
    }

    #[test]
    fn test_write_csv_guards_formulas() {
        let mut sheet = MemorySheet::new("API");
        sheet.set_formula(CellRef::new(0, 0), "=1+1").unwrap();

        let path = temp_path("guarded");
        let _cleanup = Cleanup(path.clone());

        write_csv(&path, &sheet, None, CsvMode::Guarded).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "'=1+1");
    }
}
