//! Dashboard configuration (`config.toml`).
//!
//! ```toml
//! endpoint = "https://script.google.com/macros/s/.../exec"
//! request_timeout_secs = 30
//! refresh_minutes = 5
//!
//! [ranges]
//! kpi = "API!A1:B20"
//! unassigned = "API!C1:E200"
//! fleet_pending = "API!H1:K500"
//! plan = "API!M1:N200"
//! prep = "API!O1:R500"
//! ```
//!
//! Every field is optional. The ranges must match the API sheet layout the
//! builder writes; change both together.

use directories::ProjectDirs;
use kpiboard_engine::engine::SheetRange;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DashboardError, Result};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Environment variable overriding `endpoint`.
pub const ENDPOINT_ENV: &str = "KPIBOARD_ENDPOINT";

/// A1 ranges of the API sheet read by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RangeConfig {
    pub kpi: String,
    pub unassigned: String,
    pub fleet_pending: String,
    pub plan: String,
    pub prep: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        RangeConfig {
            kpi: "API!A1:B20".to_string(),
            unassigned: "API!C1:E200".to_string(),
            fleet_pending: "API!H1:K500".to_string(),
            plan: "API!M1:N200".to_string(),
            prep: "API!O1:R500".to_string(),
        }
    }
}

impl RangeConfig {
    /// `(name, range)` pairs in fetch order.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("kpi", &self.kpi),
            ("unassigned", &self.unassigned),
            ("fleet_pending", &self.fleet_pending),
            ("plan", &self.plan),
            ("prep", &self.prep),
        ]
    }
}

/// Immutable dashboard settings, passed explicitly to the relay client and
/// the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DashboardConfig {
    /// Relay web app URL.
    pub endpoint: Option<String>,
    pub request_timeout_secs: u64,
    /// Interval of `kpiboard watch`.
    pub refresh_minutes: u32,
    pub ranges: RangeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            endpoint: None,
            request_timeout_secs: 30,
            refresh_minutes: 5,
            ranges: RangeConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DashboardConfig =
            toml::from_str(content).map_err(|e| DashboardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the endpoint when `endpoint` is a non-empty override.
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(DashboardError::MissingEndpoint)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn validate(&self) -> Result<()> {
        for (name, range) in self.ranges.entries() {
            if SheetRange::from_str(range).is_none() {
                return Err(DashboardError::Config(format!(
                    "ranges.{} is not a sheet range: '{}'",
                    name, range
                )));
            }
        }
        if self.refresh_minutes == 0 {
            return Err(DashboardError::Config(
                "refresh_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config location: `<config dir>/kpiboard/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "kpiboard")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the user config file is read
/// when present and defaults are used otherwise. [`ENDPOINT_ENV`] overrides
/// the endpoint either way.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let config = match path {
        Some(path) => read_config_file(path)?,
        None => match user_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => DashboardConfig::default(),
        },
    };
    Ok(config.with_endpoint_override(std::env::var(ENDPOINT_ENV).ok()))
}

fn read_config_file(path: &Path) -> Result<DashboardConfig> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(DashboardError::Config(format!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        )));
    }
    let content = std::fs::read_to_string(path)?;
    DashboardConfig::from_toml(&content).map_err(|err| match err {
        DashboardError::Config(msg) => {
            DashboardError::Config(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.ranges.kpi, "API!A1:B20");
        assert!(matches!(config.endpoint(), Err(DashboardError::MissingEndpoint)));
    }

    #[test]
    fn test_partial_ranges_keep_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
endpoint = "http://localhost:8080/exec"

[ranges]
plan = "API!M1:N50"
"#,
        )
        .unwrap();
        assert_eq!(config.endpoint().unwrap(), "http://localhost:8080/exec");
        assert_eq!(config.ranges.plan, "API!M1:N50");
        assert_eq!(config.ranges.prep, "API!O1:R500");
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = DashboardConfig::from_toml("endpont = \"x\"").unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_range() {
        let err = DashboardConfig::from_toml("[ranges]\nkpi = \"A1:B20\"").unwrap_err();
        assert!(err.to_string().contains("ranges.kpi"));
    }

    #[test]
    fn test_endpoint_override() {
        let config = DashboardConfig::default()
            .with_endpoint_override(Some("  http://relay/exec ".to_string()));
        assert_eq!(config.endpoint().unwrap(), "http://relay/exec");

        let config = config.with_endpoint_override(Some("   ".to_string()));
        assert_eq!(config.endpoint().unwrap(), "http://relay/exec");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let path = std::env::temp_dir().join("kpiboard_config_does_not_exist.toml");
        assert!(matches!(load_config(Some(&path)), Err(DashboardError::Io(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let temp_path = std::env::temp_dir().join(format!(
            "kpiboard_config_large_{}.toml",
            std::process::id()
        ));
        let oversized = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        std::fs::write(&temp_path, oversized).expect("write oversized config");

        let err = read_config_file(&temp_path).unwrap_err();
        assert!(err.to_string().contains("file too large"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_reads_file() {
        let temp_path = std::env::temp_dir().join(format!(
            "kpiboard_config_ok_{}.toml",
            std::process::id()
        ));
        std::fs::write(&temp_path, "refresh_minutes = 2\n").expect("write config");

        let config = read_config_file(&temp_path).unwrap();
        assert_eq!(config.refresh_minutes, 2);

        let _ = std::fs::remove_file(&temp_path);
    }
}
