//! Relay actions.
//!
//! Transport-agnostic request handling for the relay endpoint: a GET query
//! (`?action=refresh_api`) or a POST JSON body (`{"action": "refresh_api"}`)
//! goes in, an [`ActionResponse`] comes out. Handlers never propagate a fault:
//! every error becomes `{"status": "error", "message": ...}`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use kpiboard_engine::engine::SheetRange;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiLayout, refresh_api, setup_api};
use crate::error::{CoreError, Result};
use crate::sheet::Workbook;
use crate::triggers::{TriggerScheduler, parse_minutes};

/// Handler name periodic triggers call.
pub const REFRESH_HANDLER: &str = "refresh_api";

/// Largest range `get_api` will read, in cells.
pub const MAX_READ_CELLS: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    SetupApi,
    RefreshApi,
    InstallTriggers,
    RemoveTriggers,
    GetApi,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::SetupApi,
        Action::RefreshApi,
        Action::InstallTriggers,
        Action::RemoveTriggers,
        Action::GetApi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::SetupApi => "setup_api",
            Action::RefreshApi => "refresh_api",
            Action::InstallTriggers => "install_triggers",
            Action::RemoveTriggers => "remove_triggers",
            Action::GetApi => "get_api",
        }
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Wire response of every relay action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Vec<String>>>,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>) -> Self {
        ActionResponse {
            status: Status::Success,
            message: Some(message.into()),
            values: None,
        }
    }

    pub fn values(values: Vec<Vec<String>>) -> Self {
        ActionResponse {
            status: Status::Success,
            message: None,
            values: Some(values),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ActionResponse {
            status: Status::Error,
            message: Some(message.into()),
            values: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and enums always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"status":"error"}"#.to_string())
    }
}

/// Action plus its string parameters, whichever transport it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: String,
    pub params: HashMap<String, String>,
}

impl ActionRequest {
    pub fn new(action: &str) -> Self {
        ActionRequest {
            action: action.to_string(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// From GET query parameters (`action` plus the rest).
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut params = query.clone();
        let action = params.remove("action").unwrap_or_default();
        ActionRequest { action, params }
    }

    /// From a POST JSON object. Scalar fields become string parameters.
    pub fn from_json(body: &str) -> Result<Self> {
        let body = if body.trim().is_empty() { "{}" } else { body };
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
        let mut request = ActionRequest::default();
        for (key, value) in object {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            if key == "action" {
                request.action = value;
            } else {
                request.params.insert(key, value);
            }
        }
        Ok(request)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Relay endpoint state: the workbook it edits and the trigger scheduler.
pub struct Relay<W, T> {
    pub workbook: W,
    pub triggers: T,
    pub layout: ApiLayout,
}

impl<W: Workbook, T: TriggerScheduler> Relay<W, T> {
    pub fn new(workbook: W, triggers: T, layout: ApiLayout) -> Self {
        Relay {
            workbook,
            triggers,
            layout,
        }
    }

    /// Handle a GET request.
    pub fn handle_get(&mut self, query: &HashMap<String, String>) -> ActionResponse {
        let request = ActionRequest::from_query(query);
        self.respond(&request, "Action")
    }

    /// Handle a POST request body.
    pub fn handle_post(&mut self, body: &str) -> ActionResponse {
        match ActionRequest::from_json(body) {
            Ok(request) => self.respond(&request, "POST action"),
            Err(err) => {
                warn!(error = %err, "rejecting POST body");
                ActionResponse::error(err.to_string())
            }
        }
    }

    fn respond(&mut self, request: &ActionRequest, kind: &str) -> ActionResponse {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(CoreError::UnknownAction(action)) => {
                warn!(action = %action, "unknown action");
                ActionResponse::error(format!("{} '{}' is not valid.", kind, action))
            }
            Err(err) => {
                warn!(action = %request.action, error = %err, "action failed");
                ActionResponse::error(err.to_string())
            }
        }
    }

    /// Run one action. Errors are returned, not converted; see [`Relay::handle_get`].
    pub fn dispatch(&mut self, request: &ActionRequest) -> Result<ActionResponse> {
        let action: Action = request.action.parse()?;
        info!(%action, "relay action");

        match action {
            Action::SetupApi => {
                setup_api(&mut self.workbook, &self.layout)?;
                Ok(ActionResponse::success("API created and linked to the dashboard."))
            }
            Action::RefreshApi => {
                refresh_api(&mut self.workbook, &self.layout)?;
                Ok(ActionResponse::success("API refreshed."))
            }
            Action::InstallTriggers => {
                let minutes = parse_minutes(request.param("minutes"));
                self.triggers.remove_all();
                self.triggers.install_every_minutes(REFRESH_HANDLER, minutes)?;
                Ok(ActionResponse::success(format!(
                    "Trigger installed every {} min.",
                    minutes
                )))
            }
            Action::RemoveTriggers => {
                self.triggers.remove_all();
                Ok(ActionResponse::success("Triggers removed."))
            }
            Action::GetApi => {
                let raw = request.param("range").ok_or(CoreError::MissingParam("range"))?;
                let target = SheetRange::from_str(raw)
                    .ok_or_else(|| CoreError::InvalidRange(raw.to_string()))?;
                let cells = target.range.cell_count();
                if cells > MAX_READ_CELLS {
                    return Err(CoreError::InvalidRange(format!(
                        "{} covers {} cells (max {})",
                        raw, cells, MAX_READ_CELLS
                    )));
                }
                let sheet = self
                    .workbook
                    .sheet(&target.sheet)
                    .ok_or_else(|| CoreError::SheetMissing(target.sheet.clone()))?;
                Ok(ActionResponse::values(sheet.read_range(target.range)))
            }
        }
    }
}
