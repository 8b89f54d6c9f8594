//! API sheet setup and refresh.
//!
//! Writes are not transactional: a failing write leaves earlier writes in
//! place, and a re-run simply overwrites them.

use kpiboard_engine::engine::{CellRange, Located, Miss, TableBounds, locate};
use tracing::{debug, info};

use super::emit::{clip_to_width, write_import, write_kpi_formulas};
use super::layout::{ApiLayout, Block};
use crate::error::{CoreError, Result};
use crate::sheet::{Sheet, Workbook};

/// What a setup or refresh pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Blocks linked, with the dashboard range each one imports.
    pub linked: Vec<(Block, CellRange)>,
    /// Blocks not found on the dashboard; nothing was written for them.
    pub skipped: Vec<(Block, Miss)>,
    /// KPI formulas written.
    pub kpi_formulas: usize,
}

impl SetupReport {
    pub fn is_linked(&self, block: Block) -> bool {
        self.linked.iter().any(|(b, _)| *b == block)
    }
}

/// A located block waiting to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedLink {
    pub block: Block,
    pub bounds: TableBounds,
}

/// Result of scanning the dashboard once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkPlan {
    pub links: Vec<PlannedLink>,
    pub skipped: Vec<(Block, Miss)>,
}

/// Create (or re-create) the API sheet: KPI keys, block headers, block
/// imports, KPI formulas.
pub fn setup_api<W: Workbook + ?Sized>(workbook: &mut W, layout: &ApiLayout) -> Result<SetupReport> {
    if !workbook.has_sheet(&layout.source_sheet) {
        return Err(CoreError::SheetMissing(layout.source_sheet.clone()));
    }
    if !workbook.has_sheet(&layout.api_sheet) {
        info!(sheet = %layout.api_sheet, "creating API sheet");
        workbook.insert_sheet(&layout.api_sheet)?;
    }

    {
        let api = workbook
            .sheet_mut(&layout.api_sheet)
            .ok_or_else(|| CoreError::SheetMissing(layout.api_sheet.clone()))?;
        build_kpi_area(api, layout)?;
        build_block_headers(api, layout)?;
    }

    let report = link_blocks(workbook, layout)?;
    info!(
        linked = report.linked.len(),
        skipped = report.skipped.len(),
        "API sheet set up"
    );
    Ok(report)
}

/// Re-link blocks and rewrite KPI formulas on an existing API sheet.
pub fn refresh_api<W: Workbook + ?Sized>(workbook: &mut W, layout: &ApiLayout) -> Result<SetupReport> {
    if !workbook.has_sheet(&layout.source_sheet) || !workbook.has_sheet(&layout.api_sheet) {
        return Err(CoreError::NotSetUp);
    }
    let report = link_blocks(workbook, layout)?;
    info!(
        linked = report.linked.len(),
        skipped = report.skipped.len(),
        "API sheet refreshed"
    );
    Ok(report)
}

/// Locate every block (all dashboard reads first), then write the imports and
/// KPI formulas.
pub fn link_blocks<W: Workbook + ?Sized>(workbook: &mut W, layout: &ApiLayout) -> Result<SetupReport> {
    let plan = {
        let dash = workbook
            .sheet(&layout.source_sheet)
            .ok_or_else(|| CoreError::SheetMissing(layout.source_sheet.clone()))?;
        plan_links(dash, layout)
    };

    let api = workbook
        .sheet_mut(&layout.api_sheet)
        .ok_or_else(|| CoreError::SheetMissing(layout.api_sheet.clone()))?;
    let linked = apply_links(api, layout, &plan)?;
    let kpi_formulas = write_kpi_formulas(api, layout)?;

    Ok(SetupReport {
        linked,
        skipped: plan.skipped,
        kpi_formulas,
    })
}

/// KPI header cells plus one key per row; stale values under the header are cleared.
pub fn build_kpi_area(api: &mut dyn Sheet, layout: &ApiLayout) -> Result<()> {
    let (key_header, value_header) = &layout.kpi_headers;
    api.set_value(layout.kpi_top_left, key_header)?;
    api.set_value(layout.kpi_top_left.offset(0, 1), value_header)?;

    for (idx, kpi) in layout.kpis.iter().enumerate() {
        api.set_value(layout.kpi_key_cell(idx), &kpi.key)?;
    }
    if let Some(values) = layout.kpi_value_range() {
        api.clear_content(values)?;
    }
    Ok(())
}

/// Header labels of every block, so the API sheet shape is fixed even before
/// any block is linked.
pub fn build_block_headers(api: &mut dyn Sheet, layout: &ApiLayout) -> Result<()> {
    for block in &layout.blocks {
        api.set_values(block.top_left, std::slice::from_ref(&block.labels))?;
    }
    Ok(())
}

/// Read one scan window of the dashboard and locate every block.
pub fn plan_links(dash: &dyn Sheet, layout: &ApiLayout) -> LinkPlan {
    let window = dash.read_window(layout.scan_rows, layout.scan_cols);
    let mut plan = LinkPlan::default();

    for block in &layout.blocks {
        match locate(&block.source, &window, dash) {
            Located::Found(bounds) => plan.links.push(PlannedLink {
                block: block.block,
                bounds,
            }),
            Located::NotFound(miss) => {
                debug!(block = block.block.name(), ?miss, "block not found, skipping");
                plan.skipped.push((block.block, miss));
            }
        }
    }
    plan
}

/// Write one import formula per planned link.
pub fn apply_links(
    api: &mut dyn Sheet,
    layout: &ApiLayout,
    plan: &LinkPlan,
) -> Result<Vec<(Block, CellRange)>> {
    let mut linked = Vec::with_capacity(plan.links.len());
    for link in &plan.links {
        let Some(block) = layout.block(link.block) else {
            continue;
        };
        write_import(
            api,
            block.top_left,
            &layout.source_sheet,
            &link.bounds,
            block.width(),
        )?;
        linked.push((link.block, clip_to_width(link.bounds.range(), block.width())));
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{MemorySheet, MemoryWorkbook};
    use crate::storage::parse_csv_str;
    use kpiboard_engine::engine::{CellRef, DisplayGrid};

    const DASHBOARD: &str = "\
,Reporte TKC,,,Reporte Flotas
,ESTADO,Cantidad,,Estado,Cantidad
,Entregada,12,,Confirmada,4
,En distribución,3,,Grand Total,4
,,,,,
Órdenes sin asignar
Distribuidor,Estado,Cantidad
Norte,Nueva,2
Sur,Nueva,1
,,
Plan $
Distribuidor,SUM of IMPORTE
Norte,1200
,
,,,Fecha,Distribuidor,$ Min,$ Max
,,,2024-05-01,Norte,10,20
";

    fn workbook() -> MemoryWorkbook {
        MemoryWorkbook::new().with_sheet(parse_csv_str(DASHBOARD, "01 DashBoard"))
    }

    fn cell(a1: &str) -> CellRef {
        CellRef::from_str(a1).unwrap()
    }

    fn api(wb: &MemoryWorkbook) -> &MemorySheet {
        wb.memory_sheet("API").unwrap()
    }

    #[test]
    fn test_setup_requires_dashboard() {
        let mut wb = MemoryWorkbook::new();
        let err = setup_api(&mut wb, &ApiLayout::default()).unwrap_err();
        assert!(matches!(err, CoreError::SheetMissing(ref s) if s == "01 DashBoard"));
        assert!(wb.sheet_names().is_empty());
    }

    #[test]
    fn test_setup_creates_api_sheet_and_links_found_blocks() {
        let mut wb = workbook();
        let report = setup_api(&mut wb, &ApiLayout::default()).unwrap();

        assert!(report.is_linked(Block::TkcSupport));
        assert!(report.is_linked(Block::FleetSupport));
        assert!(report.is_linked(Block::Unassigned));
        assert!(report.is_linked(Block::Plan));
        assert!(report.is_linked(Block::Prep));
        assert_eq!(report.skipped, vec![(Block::FleetPending, Miss::Anchor)]);
        assert_eq!(report.kpi_formulas, 13);

        let api = api(&wb);
        assert_eq!(api.display_value(cell("A1")), "A (Key)");
        assert_eq!(api.display_value(cell("A2")), "updated_at");
        assert_eq!(api.display_value(cell("A14")), "preparar_total_max");
        assert_eq!(api.display_value(cell("K1")), "Cantidad");
        assert_eq!(
            api.formula(cell("V1")).as_deref(),
            Some("=LET(t,INDIRECT(\"'01 DashBoard'!B2:C4\"),FILTER(t, INDEX(t,,1)<>\"\" ))")
        );
        assert_eq!(
            api.formula(cell("C1")).as_deref(),
            Some("=LET(t,INDIRECT(\"'01 DashBoard'!A7:C9\"),FILTER(t, INDEX(t,,1)<>\"\" ))")
        );
        assert_eq!(
            api.formula(cell("M1")).as_deref(),
            Some("=LET(t,INDIRECT(\"'01 DashBoard'!A12:B13\"),FILTER(t, INDEX(t,,1)<>\"\" ))")
        );
        assert_eq!(
            api.formula(cell("O1")).as_deref(),
            Some("=LET(t,INDIRECT(\"'01 DashBoard'!D15:G16\"),FILTER(t, INDEX(t,,1)<>\"\" ))")
        );
        // Not found: header label stays, no formula.
        assert_eq!(api.formula(cell("H1")), None);
        assert_eq!(api.display_value(cell("H1")), "Distribuidor");
    }

    #[test]
    fn test_setup_twice_is_idempotent() {
        let mut wb = workbook();
        let layout = ApiLayout::default();
        setup_api(&mut wb, &layout).unwrap();
        let first: Vec<String> = api(&wb).read_range(CellRange::from_str("A1:Z20").unwrap()).concat();
        let report = setup_api(&mut wb, &layout).unwrap();
        let second: Vec<String> = api(&wb).read_range(CellRange::from_str("A1:Z20").unwrap()).concat();
        assert_eq!(first, second);
        assert_eq!(report.kpi_formulas, 13);
    }

    #[test]
    fn test_setup_clears_stale_kpi_values() {
        let mut wb = workbook();
        let mut stale = MemorySheet::new("API");
        stale.set_value(cell("B12"), "garbage").unwrap();
        wb = wb.with_sheet(stale);

        // Without a plan block, plan_total (B12) gets no formula.
        let mut layout = ApiLayout::default();
        layout.blocks.retain(|b| b.block != Block::Plan);
        let report = setup_api(&mut wb, &layout).unwrap();
        assert_eq!(report.kpi_formulas, 12);
        assert_eq!(api(&wb).display_value(cell("B12")), "");
        assert_eq!(api(&wb).formula(cell("B2")).as_deref(), Some("=NOW()"));
    }

    #[test]
    fn test_refresh_requires_both_sheets() {
        let mut wb = workbook();
        assert!(matches!(
            refresh_api(&mut wb, &ApiLayout::default()),
            Err(CoreError::NotSetUp)
        ));
    }

    #[test]
    fn test_refresh_follows_moved_block() {
        let mut wb = workbook();
        let layout = ApiLayout::default();
        setup_api(&mut wb, &layout).unwrap();

        // A new TKC row pushes the table one row deeper.
        let moved = DASHBOARD.replacen(
            ",En distribución,3,,Grand Total,4\n",
            ",En distribución,3,,Grand Total,4\n,Cancelada,1,,,\n",
            1,
        );
        let api_sheet = api(&wb).clone();
        let mut wb = MemoryWorkbook::new()
            .with_sheet(parse_csv_str(&moved, "01 DashBoard"))
            .with_sheet(api_sheet);

        let report = refresh_api(&mut wb, &layout).unwrap();
        assert!(report.is_linked(Block::TkcSupport));
        assert_eq!(
            api(&wb).formula(cell("V1")).as_deref(),
            Some("=LET(t,INDIRECT(\"'01 DashBoard'!B2:C5\"),FILTER(t, INDEX(t,,1)<>\"\" ))")
        );
    }

    #[test]
    fn test_plan_reads_all_blocks_before_writing() {
        let wb = workbook();
        let dash = wb.sheet("01 DashBoard").unwrap();
        let plan = plan_links(dash, &ApiLayout::default());
        assert_eq!(plan.links.len(), 5);
        assert_eq!(plan.skipped.len(), 1);
    }
}
