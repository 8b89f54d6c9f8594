use std::collections::HashMap;

use super::format::money;

/// Shown for a KPI the relay did not return.
pub const PLACEHOLDER: &str = "—";

/// Key of the last-refresh timestamp row.
pub const UPDATED_AT_KEY: &str = "updated_at";

/// KPI key to display value, built from the `Key | Value` grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KpiMap {
    values: HashMap<String, Option<String>>,
}

impl KpiMap {
    /// Every row after the header. Keys are trimmed; blank keys are skipped and
    /// a repeated key keeps its last value. A row without a value column maps
    /// the key to `None`.
    pub fn from_grid(grid: &[Vec<String>]) -> Self {
        let mut values = HashMap::new();
        for row in grid.iter().skip(1) {
            let Some(key) = row.first().map(|k| k.trim()).filter(|k| !k.is_empty()) else {
                continue;
            };
            values.insert(key.to_string(), row.get(1).cloned());
        }
        KpiMap { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn updated_at(&self) -> &str {
        self.get(UPDATED_AT_KEY).unwrap_or(PLACEHOLDER)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileFormat {
    Plain,
    Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KpiTile {
    pub key: &'static str,
    pub label: &'static str,
    pub format: TileFormat,
}

impl KpiTile {
    const fn new(key: &'static str, label: &'static str, format: TileFormat) -> Self {
        KpiTile { key, label, format }
    }

    /// Formatted value, or [`PLACEHOLDER`] when the key is missing.
    pub fn value(&self, kpis: &KpiMap) -> String {
        match (kpis.get(self.key), self.format) {
            (None, _) => PLACEHOLDER.to_string(),
            (Some(v), TileFormat::Plain) => v.to_string(),
            (Some(v), TileFormat::Money) => money(v),
        }
    }
}

/// Tile strip, left to right.
pub const KPI_TILES: [KpiTile; 6] = [
    KpiTile::new("tkc_entregada", "TKC Entregadas", TileFormat::Plain),
    KpiTile::new("tkc_en_distribucion", "TKC En distribución", TileFormat::Plain),
    KpiTile::new("sin_asignar_total", "Sin asignar", TileFormat::Plain),
    KpiTile::new("pendientes_flota_total", "Pendientes flota", TileFormat::Plain),
    KpiTile::new("plan_total", "Plan $", TileFormat::Money),
    KpiTile::new("preparar_total_max", "$ a preparar MAX", TileFormat::Money),
];
