//! Full HTML document for one [`DashboardView`].

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::DashboardView;
use super::format::escape_html;
use super::kpi::KPI_TILES;
use super::table::{TableKind, render_table};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:1.5rem;color:#1f2933}\
.kpis{display:grid;grid-template-columns:repeat(auto-fit,minmax(10rem,1fr));gap:.75rem}\
.kpi{border:1px solid #d2d6dc;border-radius:.5rem;padding:.75rem}\
.kpi .k{font-size:.85rem;color:#52606d}.kpi .v{font-size:1.5rem;font-weight:600}\
table{border-collapse:collapse;margin-bottom:1.5rem}\
th,td{border:1px solid #d2d6dc;padding:.25rem .5rem;text-align:left}";

/// The KPI tile strip.
pub fn render_kpis(view: &DashboardView) -> String {
    let mut out = String::new();
    for tile in KPI_TILES {
        let _ = write!(
            out,
            "<div class=\"kpi\"><div class=\"k\">{}</div><div class=\"v\">{}</div></div>",
            escape_html(tile.label),
            escape_html(&tile.value(&view.kpis))
        );
    }
    out
}

pub fn render_page(view: &DashboardView, generated_at: DateTime<Utc>) -> String {
    let mut out = String::from("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n<title>Bonos dashboard</title>\n");
    let _ = writeln!(out, "<style>{}</style>", STYLE);
    out.push_str("</head>\n<body>\n");

    let _ = writeln!(
        out,
        "<p id=\"last-update\">Actualización: {}</p>",
        escape_html(view.kpis.updated_at())
    );
    let _ = writeln!(out, "<div id=\"kpi-grid\" class=\"kpis\">{}</div>", render_kpis(view));

    for kind in TableKind::ALL {
        let _ = writeln!(
            out,
            "<h2>{}</h2>\n<table id=\"{}\">{}</table>",
            escape_html(kind.title()),
            kind.id(),
            render_table(view.table(kind))
        );
    }

    let _ = writeln!(
        out,
        "<footer>Generado {}</footer>",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::kpi::KpiMap;
    use chrono::TimeZone;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_page_contains_tiles_and_tables() {
        let view = DashboardView {
            kpis: KpiMap::from_grid(&[
                row(&["Key", "Value"]),
                row(&["updated_at", "16/10/2026 09:00"]),
                row(&["plan_total", "1234.5"]),
            ]),
            unassigned: vec![row(&["Distribuidor", "Fecha", "Cantidad"]), row(&["<Norte>", "x", "3"])],
            fleet_pending: Vec::new(),
            plan: Vec::new(),
            prep: Vec::new(),
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        let page = render_page(&view, at);

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("Actualización: 16/10/2026 09:00"));
        assert!(page.contains("<div class=\"k\">Plan $</div><div class=\"v\">$1,235</div>"));
        assert!(page.contains("<div class=\"k\">TKC Entregadas</div><div class=\"v\">—</div>"));
        assert!(page.contains("<td>&lt;Norte&gt;</td>"));
        assert!(page.contains("<table id=\"plan\"></table>"));
        assert!(page.contains("Generado 2026-10-16 09:30:00 UTC"));
        assert_eq!(page.matches("class=\"kpi\"").count(), 6);
    }
}
