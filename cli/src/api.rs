use pixel_canvas::snapshot::CanvasSnapshot;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use crate::CliError;

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

/// HTTP side of the canvas service.
#[derive(Debug, Clone)]
pub struct Api {
    base_url: String,
    client: reqwest::Client,
    has_session: bool,
}

impl Api {
    /// The session token is sent as a cookie when present. Snapshots can be
    /// public; realtime tickets need it.
    pub fn new(base_url: &str, session_token: Option<&str>) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = session_token {
            headers.insert(COOKIE, HeaderValue::from_str(&format!("session_token={token}"))?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
            has_session: session_token.is_some(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the initial state of a canvas.
    pub async fn snapshot(&self, canvas_id: &str) -> Result<CanvasSnapshot, CliError> {
        let body = self.request(reqwest::Method::GET, &snapshot_path(canvas_id), None).await?;
        let snapshot = serde_json::from_value::<CanvasSnapshot>(body)?;
        tracing::debug!(canvas_id, width = snapshot.width, height = snapshot.height, "snapshot fetched");
        Ok(snapshot)
    }

    /// Exchange the session cookie for a one-shot websocket ticket.
    pub async fn ws_ticket(&self) -> Result<String, CliError> {
        if !self.has_session {
            return Err(CliError::MissingSessionToken);
        }
        let body = self
            .request(reqwest::Method::POST, "/api/auth/ws-ticket", Some(Value::Object(Map::new())))
            .await?;
        body.get("ticket")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or(CliError::MissingField("ticket"))
    }

    async fn request(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value, CliError> {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.request(method, &url);
        let request = if let Some(json) = body { request.json(&json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(CliError::ServerError {
                syscall: format!("HTTP {}", status.as_u16()),
                message: value.to_string(),
            });
        }
        Ok(value)
    }
}

pub fn snapshot_path(canvas_id: &str) -> String {
    format!("/api/canvas/{canvas_id}")
}

pub fn ws_url(base_url: &str, ticket: &str) -> Result<String, CliError> {
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws?ticket={ticket}"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws?ticket={ticket}"));
    }
    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}
