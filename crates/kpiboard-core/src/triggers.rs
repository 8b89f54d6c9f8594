//! Periodic refresh triggers.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;

/// Fallback interval when a requested one is missing or below one minute.
pub const DEFAULT_TRIGGER_MINUTES: u32 = 5;

/// A time-based trigger calling `handler` every `every_minutes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub handler: String,
    pub every_minutes: u32,
    pub installed_at: DateTime<Utc>,
}

/// Installs and removes time-based triggers.
pub trait TriggerScheduler {
    fn install_every_minutes(&mut self, handler: &str, minutes: u32) -> Result<()>;

    /// Remove every trigger. Returns how many were removed.
    fn remove_all(&mut self) -> usize;

    fn triggers(&self) -> Vec<Trigger>;
}

/// In-memory scheduler; records triggers without running them.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerScheduler for TriggerRegistry {
    fn install_every_minutes(&mut self, handler: &str, minutes: u32) -> Result<()> {
        info!(handler, minutes, "installing trigger");
        self.triggers.push(Trigger {
            handler: handler.to_string(),
            every_minutes: minutes,
            installed_at: Utc::now(),
        });
        Ok(())
    }

    fn remove_all(&mut self) -> usize {
        let removed = self.triggers.len();
        self.triggers.clear();
        info!(removed, "removed triggers");
        removed
    }

    fn triggers(&self) -> Vec<Trigger> {
        self.triggers.clone()
    }
}

/// Interpret a `minutes` parameter: anything unparseable or below one minute
/// falls back to [`DEFAULT_TRIGGER_MINUTES`]; fractions are truncated.
pub fn parse_minutes(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|m| m.is_finite() && *m >= 1.0)
        .map(|m| m.min(u32::MAX as f64) as u32)
        .unwrap_or(DEFAULT_TRIGGER_MINUTES)
}
