//! HTTP client for the relay endpoint.

use std::future::Future;
use std::time::Duration;

use kpiboard_core::{ActionRequest, ActionResponse, Status};
use serde::Deserialize;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Grid of display strings, header row first.
pub type Grid = Vec<Vec<String>>;

const DEFAULT_REMOTE_ERROR: &str = "Relay returned an error";

/// Something that can run a relay action.
pub trait RelayTransport {
    fn call(&self, request: &ActionRequest) -> impl Future<Output = Result<ActionResponse>>;
}

/// Relay response as it arrives on the wire. `status` may be absent.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Grid>,
}

impl WireResponse {
    fn into_response(self) -> Result<ActionResponse> {
        match self.status {
            Some(Status::Error) => Err(DashboardError::Remote(
                self.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_REMOTE_ERROR.to_string()),
            )),
            Some(Status::Success) | None => Ok(ActionResponse {
                status: Status::Success,
                message: self.message,
                values: self.values,
            }),
        }
    }
}

/// Decode a relay response body.
pub fn decode_response(body: &str) -> Result<ActionResponse> {
    let wire: WireResponse = serde_json::from_str(body)?;
    wire.into_response()
}

/// GETs `<endpoint>?action=...&k=v` with reqwest.
#[derive(Clone, Debug)]
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpRelay {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|_| DashboardError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DashboardError::InvalidEndpoint(endpoint.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpRelay { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Full request URL for `request`. Params are sorted so URLs are stable.
    pub fn request_url(&self, request: &ActionRequest) -> reqwest::Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", &request.action);
            let mut params: Vec<_> = request.params.iter().collect();
            params.sort();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }
}

impl RelayTransport for HttpRelay {
    async fn call(&self, request: &ActionRequest) -> Result<ActionResponse> {
        let url = self.request_url(request);
        debug!(action = %request.action, "relay request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        decode_response(&body)
    }
}

/// Fetch the display values of `range` (e.g. `API!A1:B20`) through `get_api`.
pub async fn fetch_range<T: RelayTransport>(transport: &T, range: &str) -> Result<Grid> {
    let request = ActionRequest::new("get_api").with_param("range", range);
    let response = transport.call(&request).await?;
    Ok(response.values.unwrap_or_default())
}
