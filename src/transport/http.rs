use super::TransportError;
use crate::{Error, Result};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Thin JSON-over-HTTPS client bound to one API base URL and key.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `path` and decode the JSON reply.
    ///
    /// Non-2xx statuses become [`Error::Remote`], classified by status code.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-request-id", &request_id)
            .json(body);
        if let Some(key) = &self.api_key {
            req = req.header("x-goog-api-key", key);
        }

        let started = Instant::now();
        let resp = req.send().await.map_err(TransportError::Http)?;
        let status = resp.status();
        let text = resp.text().await.map_err(TransportError::Http)?;
        debug!(
            path,
            request_id = %request_id,
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "http call finished"
        );

        if !status.is_success() {
            return Err(Error::remote(status.as_u16(), remote_message(&text)));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull `error.message` out of a Google-style error body, falling back to the raw text.
fn remote_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.chars().take(512).collect())
}
