//! HTTP transport.
//!
//! Services talk to the backend through the [`Transport`] trait so the
//! network layer can be swapped (the test suite uses an in-memory backend).
//! [`HttpTransport`] is the real implementation over `reqwest`.

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the decoded JSON body.
    ///
    /// `path` is relative to the API base (e.g. `/activities/7`). An empty
    /// success body decodes as `Value::Null`.
    async fn request(&self, method: Method, path: &str, body: Option<Value>)
        -> Result<Value, ApiError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "API request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "API request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Error bodies are not always JSON; keep the raw text as the message then.
            let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));
            let err = ApiError::http(status.as_u16(), &payload);
            tracing::warn!(method = %method, url = %url, status = status.as_u16(), error = %err, "API error response");
            return Err(err);
        }

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "API response");
        parse_body(&text)
    }
}

/// Decode a success body; whitespace-only bodies are `null`.
pub(crate) fn parse_body(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

/// Reject ids the backend could never have assigned.
pub(crate) fn ensure_id(id: i64, what: &str) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "{} id must be a positive integer (got {})",
            what, id
        )));
    }
    Ok(())
}
