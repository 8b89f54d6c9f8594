use std::fmt::Write;

use super::format::escape_html;
use crate::config::RangeConfig;

/// The four tables under the KPI strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Unassigned,
    FleetPending,
    Plan,
    Prep,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Unassigned,
        TableKind::FleetPending,
        TableKind::Plan,
        TableKind::Prep,
    ];

    /// HTML element id.
    pub fn id(self) -> &'static str {
        match self {
            TableKind::Unassigned => "sin-asignar",
            TableKind::FleetPending => "pendientes-flota",
            TableKind::Plan => "plan",
            TableKind::Prep => "preparar",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TableKind::Unassigned => "Sin asignar",
            TableKind::FleetPending => "Pendientes flota",
            TableKind::Plan => "Plan",
            TableKind::Prep => "A preparar",
        }
    }

    pub fn range(self, ranges: &RangeConfig) -> &str {
        match self {
            TableKind::Unassigned => &ranges.unassigned,
            TableKind::FleetPending => &ranges.fleet_pending,
            TableKind::Plan => &ranges.plan,
            TableKind::Prep => &ranges.prep,
        }
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|v| v.trim().is_empty())
}

/// `<thead>` from the first row plus `<tbody>` from the non-blank rest.
/// An empty grid renders as nothing.
pub fn render_table(grid: &[Vec<String>]) -> String {
    let Some((header, rows)) = grid.split_first() else {
        return String::new();
    };

    let mut out = String::from("<thead><tr>");
    for col in header {
        let _ = write!(out, "<th>{}</th>", escape_html(col));
    }
    out.push_str("</tr></thead><tbody>");
    for row in rows.iter().filter(|r| !is_blank_row(r)) {
        out.push_str("<tr>");
        for value in row {
            let _ = write!(out, "<td>{}</td>", escape_html(value));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody>");
    out
}
