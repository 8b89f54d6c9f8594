//! Error types for the dashboard side

use thiserror::Error;

/// Errors that end a dashboard load or a relay call.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay responded {0}")]
    Status(u16),

    #[error("Relay returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The relay answered with `status != "success"`.
    #[error("{0}")]
    Remote(String),

    #[error("Missing relay endpoint (set `endpoint` in config.toml or KPIBOARD_ENDPOINT)")]
    MissingEndpoint,

    #[error("Invalid relay endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
