//! Command-line interface.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use kpiboard_core::storage::{CsvMode, parse_csv, write_csv};
use kpiboard_core::{ApiLayout, MemoryWorkbook, SetupReport, setup_api};
use kpiboard_engine::engine::Miss;
use tracing::info;

use crate::config::{DashboardConfig, load_config};
use crate::dashboard::{Dashboard, DashboardView, render_page};
use crate::notify::{LogNotifier, Notifier};
use crate::relay_client::{HttpRelay, RelayTransport};

#[derive(Parser, Debug)]
#[command(name = "kpiboard")]
#[command(author, version, about = "Logistics KPI dashboard and API sheet builder")]
pub struct Cli {
    /// Config file (default: <config dir>/kpiboard/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every range and write the dashboard page
    Render {
        #[arg(short, long, default_value = "dashboard.html")]
        out: PathBuf,
    },

    /// Run setup_api on the relay, then render
    Setup {
        #[arg(short, long, default_value = "dashboard.html")]
        out: PathBuf,
    },

    /// Run refresh_api on the relay, then render
    Refresh {
        #[arg(short, long, default_value = "dashboard.html")]
        out: PathBuf,

        /// Do not report refresh progress or refresh failures
        #[arg(short, long)]
        silent: bool,
    },

    /// Silently refresh and re-render on an interval until interrupted
    Watch {
        #[arg(short, long, default_value = "dashboard.html")]
        out: PathBuf,

        /// Minutes between refreshes (default: refresh_minutes from config)
        #[arg(short, long)]
        minutes: Option<u32>,
    },

    /// Install the periodic refresh_api trigger on the relay
    InstallTriggers {
        #[arg(short, long, default_value_t = 5)]
        minutes: u32,
    },

    /// Remove every relay trigger
    RemoveTriggers,

    /// Build the API sheet offline from a CSV export of the dashboard sheet
    Build {
        /// CSV export of the dashboard sheet
        #[arg(short, long)]
        dashboard: PathBuf,

        /// Where to write the API sheet (formulas are kept as text)
        #[arg(short, long, default_value = "api.csv")]
        out: PathBuf,
    },
}

/// What a parsed command needs: `build` runs offline, everything else goes
/// through the relay.
#[derive(Debug, PartialEq, Eq)]
enum Task {
    Build { dashboard: PathBuf, out: PathBuf },
    Remote(RemoteCommand),
}

#[derive(Debug, PartialEq, Eq)]
enum RemoteCommand {
    Render { out: PathBuf },
    Setup { out: PathBuf },
    Refresh { out: PathBuf, silent: bool },
    Watch { out: PathBuf, minutes: Option<u32> },
    InstallTriggers { minutes: u32 },
    RemoveTriggers,
}

impl From<Commands> for Task {
    fn from(command: Commands) -> Self {
        let remote = match command {
            Commands::Build { dashboard, out } => return Task::Build { dashboard, out },
            Commands::Render { out } => RemoteCommand::Render { out },
            Commands::Setup { out } => RemoteCommand::Setup { out },
            Commands::Refresh { out, silent } => RemoteCommand::Refresh { out, silent },
            Commands::Watch { out, minutes } => RemoteCommand::Watch { out, minutes },
            Commands::InstallTriggers { minutes } => RemoteCommand::InstallTriggers { minutes },
            Commands::RemoveTriggers => RemoteCommand::RemoveTriggers,
        };
        Task::Remote(remote)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    match Task::from(cli.command) {
        Task::Build { dashboard, out } => build(&dashboard, &out),
        Task::Remote(command) => {
            let config = load_config(cli.config.as_deref()).context("loading config")?;
            run_remote(connect(config)?, command).await
        }
    }
}

async fn run_remote(
    dash: Dashboard<HttpRelay, LogNotifier>,
    command: RemoteCommand,
) -> Result<()> {
    match command {
        RemoteCommand::Render { out } => write_view(dash.load().await.as_ref(), &out),
        RemoteCommand::Setup { out } => write_view(dash.setup().await.as_ref(), &out),
        RemoteCommand::Refresh { out, silent } => write_view(dash.refresh(silent).await.as_ref(), &out),
        RemoteCommand::Watch { out, minutes } => {
            let minutes = minutes.unwrap_or(dash.config().refresh_minutes).max(1);
            watch(&dash, &out, minutes, tokio::signal::ctrl_c()).await
        }
        RemoteCommand::InstallTriggers { minutes } => {
            let message = dash.install_triggers(minutes).await?;
            println!("{}", message.as_deref().unwrap_or("Trigger installed."));
            Ok(())
        }
        RemoteCommand::RemoveTriggers => {
            let message = dash.remove_triggers().await?;
            println!("{}", message.as_deref().unwrap_or("Triggers removed."));
            Ok(())
        }
    }
}

fn build(dashboard: &Path, out: &Path) -> Result<()> {
    let report = build_api_sheet(dashboard, out, &ApiLayout::default())?;
    print_report(&report);
    println!("Wrote {}", out.display());
    Ok(())
}

fn connect(config: DashboardConfig) -> Result<Dashboard<HttpRelay, LogNotifier>> {
    let relay = HttpRelay::new(config.endpoint()?, config.request_timeout())?;
    info!(endpoint = %relay.endpoint(), "using relay");
    Ok(Dashboard::new(config, relay, LogNotifier))
}

/// Write the page for `view`. A missing view has already been alerted and
/// leaves the previous page in place.
fn write_view(view: Option<&DashboardView>, out: &Path) -> Result<()> {
    let Some(view) = view else {
        anyhow::bail!("dashboard not rendered");
    };
    std::fs::write(out, render_page(view, Utc::now()))
        .with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), "dashboard written");
    Ok(())
}

/// Refresh and re-render every `minutes` until `shutdown` resolves.
async fn watch<T: RelayTransport, N: Notifier>(
    dash: &Dashboard<T, N>,
    out: &Path,
    minutes: u32,
    shutdown: impl Future,
) -> Result<()> {
    info!(minutes, path = %out.display(), "watching");
    let mut ticker = tokio::time::interval(Duration::from_secs(u64::from(minutes) * 60));
    // Polled across turns, so an interrupt during a refresh is still seen.
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed cycle keeps the last page; the next tick tries again.
                if let Some(view) = dash.refresh(true).await {
                    write_view(Some(&view), out)?;
                }
            }
            _ = &mut shutdown => {
                info!("stopping");
                return Ok(());
            }
        }
    }
}

/// Run setup on an in-memory workbook holding `dashboard_csv` as the
/// dashboard sheet, and write the resulting API sheet to `out`.
pub fn build_api_sheet(dashboard_csv: &Path, out: &Path, layout: &ApiLayout) -> Result<SetupReport> {
    let dash = parse_csv(dashboard_csv, &layout.source_sheet)
        .with_context(|| format!("reading {}", dashboard_csv.display()))?;
    let mut workbook = MemoryWorkbook::new().with_sheet(dash);
    let report = setup_api(&mut workbook, layout)?;

    let api = workbook
        .memory_sheet(&layout.api_sheet)
        .context("API sheet was not created")?;
    write_csv(out, api, None, CsvMode::Raw)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(report)
}

fn describe_miss(miss: Miss) -> &'static str {
    match miss {
        Miss::Anchor => "title not found",
        Miss::HeaderRow => "header row not found",
    }
}

fn print_report(report: &SetupReport) {
    for (block, range) in &report.linked {
        println!("linked   {:<14} {}", block.name(), range);
    }
    for (block, miss) in &report.skipped {
        println!("skipped  {:<14} {}", block.name(), describe_miss(*miss));
    }
    println!("{} KPI formulas", report.kpi_formulas);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::task::Poll;

    use kpiboard_core::{ActionRequest, ActionResponse};

    use super::*;
    use crate::notify::RecordingNotifier;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["kpiboard", "refresh", "--silent"]);
        assert!(matches!(cli.command, Commands::Refresh { silent: true, .. }));

        let cli = Cli::parse_from(["kpiboard", "install-triggers"]);
        assert!(matches!(cli.command, Commands::InstallTriggers { minutes: 5 }));

        let cli = Cli::parse_from(["kpiboard", "--config", "k.toml", "watch", "-m", "2"]);
        assert_eq!(cli.config, Some(PathBuf::from("k.toml")));
        assert!(matches!(cli.command, Commands::Watch { minutes: Some(2), .. }));

        let cli = Cli::parse_from(["kpiboard", "build", "--dashboard", "dash.csv"]);
        match cli.command {
            Commands::Build { dashboard, out } => {
                assert_eq!(dashboard, PathBuf::from("dash.csv"));
                assert_eq!(out, PathBuf::from("api.csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_runs_offline() {
        let cli = Cli::parse_from(["kpiboard", "build", "-d", "dash.csv", "-o", "out.csv"]);
        assert_eq!(
            Task::from(cli.command),
            Task::Build {
                dashboard: PathBuf::from("dash.csv"),
                out: PathBuf::from("out.csv"),
            }
        );
    }

    #[test]
    fn test_relay_commands_route_remote() {
        let cli = Cli::parse_from(["kpiboard", "refresh", "--silent"]);
        assert_eq!(
            Task::from(cli.command),
            Task::Remote(RemoteCommand::Refresh {
                out: PathBuf::from("dashboard.html"),
                silent: true,
            })
        );

        let cli = Cli::parse_from(["kpiboard", "remove-triggers"]);
        assert_eq!(Task::from(cli.command), Task::Remote(RemoteCommand::RemoveTriggers));
    }

    /// Answers every action with an empty grid and raises `interrupted`
    /// while the refresh is running.
    struct InterruptedRelay {
        interrupted: Cell<bool>,
        calls: Cell<usize>,
    }

    impl RelayTransport for InterruptedRelay {
        async fn call(
            &self,
            request: &ActionRequest,
        ) -> crate::error::Result<ActionResponse> {
            self.calls.set(self.calls.get() + 1);
            if request.action == "refresh_api" {
                self.interrupted.set(true);
            }
            Ok(ActionResponse::values(Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_watch_stops_on_interrupt_during_refresh() {
        let relay = InterruptedRelay {
            interrupted: Cell::new(false),
            calls: Cell::new(0),
        };
        let dash = Dashboard::new(DashboardConfig::default(), relay, RecordingNotifier::new());
        let out = std::env::temp_dir().join(format!("kpiboard_watch_{}.html", std::process::id()));
        let interrupted = std::future::poll_fn(|_| {
            if dash.transport().interrupted.get() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        });

        watch(&dash, &out, 60, interrupted).await.unwrap();

        // One refresh_api plus five range reads, then no further cycle.
        assert_eq!(dash.transport().calls.get(), 6);
        let page = std::fs::read_to_string(&out).unwrap();
        assert!(page.contains("<html"));
        let _ = std::fs::remove_file(&out);
    }

    #[test]
    fn test_build_requires_dashboard() {
        assert!(Cli::try_parse_from(["kpiboard", "build"]).is_err());
    }
}
