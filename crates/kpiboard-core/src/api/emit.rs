//! Formula emission.
//!
//! Every formula here is a pure function of the layout and the located
//! bounds, so re-running setup writes byte-identical formulas.

use kpiboard_engine::engine::{CellRange, CellRef, TableBounds, TableWidth};
use tracing::info;

use super::layout::{ApiLayout, KpiSource};
use crate::error::Result;
use crate::sheet::Sheet;

/// Escape text for use inside a formula string literal.
fn string_literal(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Keep only the first `width` columns of `range`.
pub fn clip_to_width(range: CellRange, width: TableWidth) -> CellRange {
    let last_col = (range.start.col + width.columns() - 1).min(range.end.col);
    CellRange::new(range.start, CellRef::new(last_col, range.end.row))
}

/// Live import of `range` on `source_sheet`, dropping rows whose first column is blank.
///
/// ```text
/// =LET(t,INDIRECT("'01 DashBoard'!D5:F30"),FILTER(t, INDEX(t,,1)<>"" ))
/// ```
pub fn import_formula(source_sheet: &str, range: CellRange) -> String {
    let reference = format!("'{}'!{}", source_sheet.replace('\'', "''"), range);
    format!(
        "=LET(t,INDIRECT({}),FILTER(t, INDEX(t,,1)<>\"\" ))",
        string_literal(&reference)
    )
}

/// Exact-match lookup of `label` in `keys`, returning the matching cell of
/// `values`, or zero when the label is absent.
pub fn lookup_formula(label: &str, keys: CellRange, values: CellRange) -> String {
    format!(
        "=IFERROR(XLOOKUP({},{}:{},{}:{}),0)",
        string_literal(label),
        keys.start.to_absolute(),
        keys.end.to_absolute(),
        values.start.to_absolute(),
        values.end.to_absolute(),
    )
}

/// Sum of `col` from `first_row` to the bottom of the sheet, zero on error.
pub fn sum_formula(col: usize, first_row: usize) -> String {
    let letters = CellRef::col_to_letters(col);
    format!(
        "=IFERROR(SUM({}:${}),0)",
        CellRef::new(col, first_row).to_absolute(),
        letters
    )
}

pub fn now_formula() -> String {
    "=NOW()".to_string()
}

/// Formula for one KPI value cell, or `None` when the source block is not in
/// the layout.
pub fn kpi_formula(layout: &ApiLayout, source: &KpiSource) -> Option<String> {
    match source {
        KpiSource::Now => Some(now_formula()),
        KpiSource::Lookup { block, label } => {
            let block = layout.block(*block)?;
            let first = block.top_left.row + 1;
            let last = layout.support_last_row.checked_sub(1)?.max(first);
            let keys = CellRange::new(
                CellRef::new(block.column(0), first),
                CellRef::new(block.column(0), last),
            );
            let values = CellRange::new(
                CellRef::new(block.column(1), first),
                CellRef::new(block.column(1), last),
            );
            Some(lookup_formula(label, keys, values))
        }
        KpiSource::Sum { block, offset } => {
            let block = layout.block(*block)?;
            Some(sum_formula(block.column(*offset), block.top_left.row + 1))
        }
    }
}

/// All KPI value formulas with their destination cells, in key order.
pub fn kpi_formulas(layout: &ApiLayout) -> Vec<(CellRef, String)> {
    layout
        .kpis
        .iter()
        .enumerate()
        .filter_map(|(idx, kpi)| {
            kpi_formula(layout, &kpi.source).map(|f| (layout.kpi_value_cell(idx), f))
        })
        .collect()
}

/// Write the import formula for a located table at `top_left`.
/// Returns the formula written.
pub fn write_import(
    api: &mut dyn Sheet,
    top_left: CellRef,
    source_sheet: &str,
    bounds: &TableBounds,
    width: TableWidth,
) -> Result<String> {
    let range = clip_to_width(bounds.range(), width);
    let formula = import_formula(source_sheet, range);
    api.set_formula(top_left, &formula)?;
    info!(sheet = api.name(), cell = %top_left, source = %range, "linked block");
    Ok(formula)
}

/// Write every KPI value formula. Returns the number of formulas written.
pub fn write_kpi_formulas(api: &mut dyn Sheet, layout: &ApiLayout) -> Result<usize> {
    let formulas = kpi_formulas(layout);
    for (cell, formula) in &formulas {
        api.set_formula(*cell, formula)?;
    }
    info!(sheet = api.name(), count = formulas.len(), "wrote KPI formulas");
    Ok(formulas.len())
}
