//! kpiboard - logistics KPI dashboard fed by a spreadsheet relay.
//!
//! The relay exposes an "API" sheet built by `kpiboard-core`; this crate
//! fetches its ranges over HTTP and renders them as an HTML page.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod relay_client;

pub use config::{DashboardConfig, RangeConfig, load_config};
pub use dashboard::{Dashboard, DashboardView, render_page};
pub use error::{DashboardError, Result};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use relay_client::{Grid, HttpRelay, RelayTransport, fetch_range};
