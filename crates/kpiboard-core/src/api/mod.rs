//! The API sheet: layout, formula emission and the setup/refresh passes.

mod builder;
mod emit;
mod layout;

pub use builder::{
    LinkPlan, PlannedLink, SetupReport, apply_links, build_block_headers, build_kpi_area,
    link_blocks, plan_links, refresh_api, setup_api,
};
pub use emit::{
    clip_to_width, import_formula, kpi_formula, kpi_formulas, lookup_formula, now_formula,
    sum_formula, write_import, write_kpi_formulas,
};
pub use layout::{ApiLayout, Block, BlockLayout, KpiBinding, KpiSource};
