//! Dashboard renderer.
//!
//! Pulls five ranges of the API sheet through the relay and renders one KPI
//! tile strip and four tables. A load is all-or-nothing: if any fetch fails
//! the user gets one alert and no view.

mod format;
mod kpi;
mod page;
mod table;

pub use format::{escape_html, money};
pub use kpi::{KPI_TILES, KpiMap, KpiTile, PLACEHOLDER, TileFormat, UPDATED_AT_KEY};
pub use page::{render_kpis, render_page};
pub use table::{TableKind, render_table};

use kpiboard_core::{Action, ActionRequest};
use tracing::info;

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::notify::Notifier;
use crate::relay_client::{Grid, RelayTransport, fetch_range};

/// One successful load of every range.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub kpis: KpiMap,
    pub unassigned: Grid,
    pub fleet_pending: Grid,
    pub plan: Grid,
    pub prep: Grid,
}

impl DashboardView {
    pub fn table(&self, kind: TableKind) -> &Grid {
        match kind {
            TableKind::Unassigned => &self.unassigned,
            TableKind::FleetPending => &self.fleet_pending,
            TableKind::Plan => &self.plan,
            TableKind::Prep => &self.prep,
        }
    }
}

pub struct Dashboard<T, N> {
    config: DashboardConfig,
    transport: T,
    notifier: N,
}

impl<T: RelayTransport, N: Notifier> Dashboard<T, N> {
    pub fn new(config: DashboardConfig, transport: T, notifier: N) -> Self {
        Dashboard {
            config,
            transport,
            notifier,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetch all five ranges concurrently.
    pub async fn try_load(&self) -> Result<DashboardView> {
        let (transport, ranges) = (&self.transport, &self.config.ranges);
        let table = move |kind: TableKind| fetch_range(transport, kind.range(ranges));
        let (kpi, unassigned, fleet_pending, plan, prep) = tokio::try_join!(
            fetch_range(transport, &ranges.kpi),
            table(TableKind::Unassigned),
            table(TableKind::FleetPending),
            table(TableKind::Plan),
            table(TableKind::Prep),
        )?;
        info!(
            kpis = kpi.len().saturating_sub(1),
            unassigned = unassigned.len(),
            fleet_pending = fleet_pending.len(),
            plan = plan.len(),
            prep = prep.len(),
            "dashboard loaded"
        );
        Ok(DashboardView {
            kpis: KpiMap::from_grid(&kpi),
            unassigned,
            fleet_pending,
            plan,
            prep,
        })
    }

    /// [`Dashboard::try_load`], alerting once on failure.
    pub async fn load(&self) -> Option<DashboardView> {
        match self.try_load().await {
            Ok(view) => Some(view),
            Err(err) => {
                self.notifier.alert(&err.to_string());
                None
            }
        }
    }

    /// Run `setup_api`, then load. Nothing is rendered when setup fails.
    pub async fn setup(&self) -> Option<DashboardView> {
        self.notifier.notify("Configurando API…");
        match self.run(Action::SetupApi, ActionRequest::new(Action::SetupApi.as_str())).await {
            Ok(message) => {
                self.notifier
                    .notify(message.as_deref().unwrap_or("API configurada."));
                self.load().await
            }
            Err(err) => {
                self.notifier.alert(&format!("Setup falló: {}", err));
                None
            }
        }
    }

    /// Run `refresh_api`, then load whatever the sheet holds, even when the
    /// refresh failed. `silent` suppresses the progress messages and the
    /// refresh alert; a failed load still alerts.
    pub async fn refresh(&self, silent: bool) -> Option<DashboardView> {
        if !silent {
            self.notifier.notify("Actualizando API…");
        }
        match self.run(Action::RefreshApi, ActionRequest::new(Action::RefreshApi.as_str())).await {
            Ok(message) => {
                if !silent {
                    self.notifier
                        .notify(message.as_deref().unwrap_or("API actualizada."));
                }
            }
            Err(err) => {
                if !silent {
                    self.notifier.alert(&format!("Refresh falló: {}", err));
                }
            }
        }
        self.load().await
    }

    /// Ask the relay to refresh every `minutes`. Returns the relay's message.
    pub async fn install_triggers(&self, minutes: u32) -> Result<Option<String>> {
        let request = ActionRequest::new(Action::InstallTriggers.as_str())
            .with_param("minutes", minutes.to_string());
        self.run(Action::InstallTriggers, request).await
    }

    pub async fn remove_triggers(&self) -> Result<Option<String>> {
        self.run(
            Action::RemoveTriggers,
            ActionRequest::new(Action::RemoveTriggers.as_str()),
        )
        .await
    }

    async fn run(&self, action: Action, request: ActionRequest) -> Result<Option<String>> {
        info!(%action, "calling relay");
        let response = self.transport.call(&request).await?;
        Ok(response.message)
    }
}
