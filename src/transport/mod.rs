//! HTTP transport for the hosted generative-language API.

mod http;

pub use http::HttpTransport;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Connection-level failures and timeouts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TransportError::Other(_) => false,
        }
    }
}
