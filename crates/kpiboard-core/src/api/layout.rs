//! Layout of the API sheet and the dashboard blocks feeding it.
//!
//! The sheet names, block positions and KPI rows here are the contract with the
//! dashboard page: its range constants read exactly these cells.

use kpiboard_engine::engine::{CellRange, CellRef, TableSpec, TableWidth};

/// A block imported from the dashboard sheet into the API sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    /// TKC report (status/count); hidden support table for KPI lookups.
    TkcSupport,
    /// Fleet report (status/count); hidden support table for KPI lookups.
    FleetSupport,
    Unassigned,
    FleetPending,
    Plan,
    Prep,
}

impl Block {
    pub fn name(self) -> &'static str {
        match self {
            Block::TkcSupport => "tkc",
            Block::FleetSupport => "flotas",
            Block::Unassigned => "sin_asignar",
            Block::FleetPending => "pendientes_flota",
            Block::Plan => "plan",
            Block::Prep => "preparar",
        }
    }
}

/// Where a block comes from and where it lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub block: Block,
    /// How to find the block on the dashboard sheet.
    pub source: TableSpec,
    /// Top-left cell of the block on the API sheet (header row).
    pub top_left: CellRef,
    /// Header labels written on the API sheet; their count is the block width.
    pub labels: Vec<String>,
}

impl BlockLayout {
    fn new(block: Block, source: TableSpec, top_left: &str, labels: &[&str]) -> Self {
        BlockLayout {
            block,
            source,
            top_left: a1(top_left),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Column `offset` of the block (0 is the key column).
    pub fn column(&self, offset: usize) -> usize {
        self.top_left.col + offset
    }

    pub fn width(&self) -> TableWidth {
        self.source.width
    }
}

/// How a KPI value cell is computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KpiSource {
    /// Recalculation timestamp.
    Now,
    /// Exact-match lookup of `label` in a two-column support block, zero on miss.
    Lookup { block: Block, label: String },
    /// Sum of one column of a block (data rows only), zero on error.
    Sum { block: Block, offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KpiBinding {
    pub key: String,
    pub source: KpiSource,
}

impl KpiBinding {
    fn new(key: &str, source: KpiSource) -> Self {
        KpiBinding {
            key: key.to_string(),
            source,
        }
    }
}

/// Immutable description of the API sheet. Pass it explicitly; nothing reads
/// layout from globals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiLayout {
    /// Human-maintained sheet the blocks are detected on.
    pub source_sheet: String,
    /// Sheet the builder owns and the dashboard page reads.
    pub api_sheet: String,
    pub scan_rows: usize,
    pub scan_cols: usize,
    /// Header cells of the KPI key/value area.
    pub kpi_headers: (String, String),
    /// KPI key column; keys start on the row below the header.
    pub kpi_top_left: CellRef,
    pub kpis: Vec<KpiBinding>,
    /// Last row read by support-table lookups.
    pub support_last_row: usize,
    /// Blocks in linking order.
    pub blocks: Vec<BlockLayout>,
}

fn a1(s: &str) -> CellRef {
    CellRef::from_str(s).expect("layout cell literals are valid A1 references")
}

fn lookup(block: Block, label: &str) -> KpiSource {
    KpiSource::Lookup {
        block,
        label: label.to_string(),
    }
}

impl Default for ApiLayout {
    fn default() -> Self {
        let blocks = vec![
            BlockLayout::new(
                Block::TkcSupport,
                TableSpec::titled("reporte tkc", &["estado", "cantidad"]),
                "V1",
                &["ESTADO", "Cantidad"],
            ),
            BlockLayout::new(
                Block::FleetSupport,
                TableSpec::titled("reporte flotas", &["estado", "cantidad"]),
                "Y1",
                &["ESTADO", "Cantidad"],
            ),
            BlockLayout::new(
                Block::Unassigned,
                TableSpec::titled("ordenes sin asignar", &["distribuidor", "estado", "cantidad"]),
                "C1",
                &["Distribuidor", "Estado", "Cantidad"],
            ),
            BlockLayout::new(
                Block::FleetPending,
                TableSpec::titled(
                    "ordenes pendientes en flota",
                    &["distribuidor", "fecha", "id", "cantidad"],
                ),
                "H1",
                &["Distribuidor", "Fecha", "Id Orden", "Cantidad"],
            ),
            // Pivot headers read "SUM of IMPORTE": three needles, two columns.
            BlockLayout::new(
                Block::Plan,
                TableSpec::titled("plan $", &["distribuidor", "sum", "importe"])
                    .with_width(TableWidth::Two),
                "M1",
                &["Distribuidor", "Importe"],
            ),
            BlockLayout::new(
                Block::Prep,
                TableSpec::by_headers(&["fecha", "distribuidor", "min", "max"]),
                "O1",
                &["Fecha", "Distribuidor", "$ Min", "$ Max"],
            ),
        ];

        let kpis = vec![
            KpiBinding::new("updated_at", KpiSource::Now),
            KpiBinding::new("tkc_cancelada", lookup(Block::TkcSupport, "Cancelada")),
            KpiBinding::new("tkc_en_distribucion", lookup(Block::TkcSupport, "En distribución")),
            KpiBinding::new("tkc_entregada", lookup(Block::TkcSupport, "Entregada")),
            KpiBinding::new("tkc_lista_distribuir", lookup(Block::TkcSupport, "Lista para distribuir")),
            KpiBinding::new("flota_confirmada", lookup(Block::FleetSupport, "Confirmada")),
            KpiBinding::new(
                "flota_ordenado_desp_distrib",
                lookup(Block::FleetSupport, "Ordenado Desp. y Distrib."),
            ),
            KpiBinding::new("flota_total", lookup(Block::FleetSupport, "Grand Total")),
            KpiBinding::new("sin_asignar_total", KpiSource::Sum { block: Block::Unassigned, offset: 2 }),
            KpiBinding::new("pendientes_flota_total", KpiSource::Sum { block: Block::FleetPending, offset: 3 }),
            KpiBinding::new("plan_total", KpiSource::Sum { block: Block::Plan, offset: 1 }),
            KpiBinding::new("preparar_total_min", KpiSource::Sum { block: Block::Prep, offset: 2 }),
            KpiBinding::new("preparar_total_max", KpiSource::Sum { block: Block::Prep, offset: 3 }),
        ];

        ApiLayout {
            source_sheet: "01 DashBoard".to_string(),
            api_sheet: "API".to_string(),
            scan_rows: 400,
            scan_cols: 40,
            kpi_headers: ("A (Key)".to_string(), "B (Value)".to_string()),
            kpi_top_left: a1("A1"),
            kpis,
            support_last_row: 50,
            blocks,
        }
    }
}

impl ApiLayout {
    pub fn block(&self, block: Block) -> Option<&BlockLayout> {
        self.blocks.iter().find(|b| b.block == block)
    }

    /// Cell holding the key of KPI number `index`.
    pub fn kpi_key_cell(&self, index: usize) -> CellRef {
        self.kpi_top_left.offset(index + 1, 0)
    }

    /// Cell holding the value of KPI number `index`.
    pub fn kpi_value_cell(&self, index: usize) -> CellRef {
        self.kpi_top_left.offset(index + 1, 1)
    }

    /// Value column under the KPI header (`B2:B14` by default).
    pub fn kpi_value_range(&self) -> Option<CellRange> {
        if self.kpis.is_empty() {
            return None;
        }
        Some(CellRange::new(
            self.kpi_value_cell(0),
            self.kpi_value_cell(self.kpis.len() - 1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kpi_rows() {
        let layout = ApiLayout::default();
        assert_eq!(layout.kpis.len(), 13);
        assert_eq!(layout.kpi_key_cell(0).to_string(), "A2");
        assert_eq!(layout.kpi_value_cell(12).to_string(), "B14");
        assert_eq!(layout.kpi_value_range().unwrap().to_string(), "B2:B14");
        assert_eq!(layout.kpis[12].key, "preparar_total_max");
    }

    #[test]
    fn test_labels_match_block_widths() {
        let layout = ApiLayout::default();
        for block in &layout.blocks {
            assert_eq!(
                block.labels.len(),
                block.width().columns(),
                "{} labels do not match width",
                block.block.name()
            );
        }
    }

    #[test]
    fn test_blocks_do_not_overlap() {
        let layout = ApiLayout::default();
        let mut spans: Vec<(usize, usize)> = layout
            .blocks
            .iter()
            .map(|b| (b.top_left.col, b.column(b.width().columns() - 1)))
            .collect();
        spans.sort();
        for pair in spans.windows(2) {
            assert!(pair[0].1 < pair[1].0, "blocks overlap: {:?}", pair);
        }
        // KPI area occupies A:B.
        assert!(spans[0].0 > 1);
    }
}
