//! Text-generation drivers.
//!
//! [`TextGenerator`] is the seam between the assistant and the hosted model:
//! the assistant only ever sees messages in and text out, so tests can swap in
//! a scripted generator and the Gemini wire format stays inside [`gemini`].

pub mod gemini;

use async_trait::async_trait;

use crate::types::Message;
use crate::Result;

pub use gemini::{GeminiClient, GeminiDriver};

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    /// Ask the model to reply with a JSON document.
    pub json_output: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.2),
            max_output_tokens: Some(1024),
            json_output: false,
        }
    }
}

impl GenerationOptions {
    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn with_max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Parsed non-streaming response.
#[derive(Debug, Clone)]
pub struct DriverResponse {
    /// Concatenated text of the first candidate, if any.
    pub content: Option<String>,
    /// Finish reason normalized to lowercase (`stop`, `length`, `content_filter`, ...).
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

/// Prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, messages: &[Message], options: &GenerationOptions) -> Result<String>;

    /// Model identifier, used in cache fingerprints and logs.
    fn model(&self) -> &str;
}
