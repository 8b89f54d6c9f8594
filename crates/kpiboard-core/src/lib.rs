//! kpiboard-core - spreadsheet model, API sheet builder and relay actions.

pub mod api;
pub mod error;
pub mod relay;
pub mod sheet;
pub mod storage;
pub mod triggers;

pub use api::{ApiLayout, Block, SetupReport, refresh_api, setup_api};
pub use error::{CoreError, Result};
pub use relay::{Action, ActionRequest, ActionResponse, Relay, Status};
pub use sheet::{CellContent, MemorySheet, MemoryWorkbook, Sheet, Workbook};
pub use triggers::{Trigger, TriggerRegistry, TriggerScheduler};

pub use kpiboard_engine::engine::{CellRange, CellRef, SheetRange};
