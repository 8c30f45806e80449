//! Google Gemini generateContent driver.
//!
//! Key differences from chat-completions style APIs:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - Roles: `user` and `model` (not `assistant`). System uses `system_instruction`.
//! - `generationConfig` wraps temperature, max_tokens (→ `maxOutputTokens`), etc.
//! - Response: `candidates[0].content.parts[*].text`.
//! - API key travels in the `x-goog-api-key` header.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{DriverResponse, GenerationOptions, TextGenerator, UsageInfo};
use crate::transport::HttpTransport;
use crate::types::{Message, MessageRole};
use crate::{Error, ErrorContext, Result};

/// Request/response shape conversion for the generateContent API.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiDriver;

impl GeminiDriver {
    pub fn new() -> Self {
        Self
    }

    /// Path of the generateContent endpoint for `model`.
    pub fn generate_path(model: &str) -> String {
        format!("/v1beta/models/{}:generateContent", strip_models_prefix(model))
    }

    /// Separate system instructions from conversation contents.
    /// Gemini uses `system_instruction` as a top-level field.
    fn split_messages(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for m in messages {
            let role = match m.role {
                MessageRole::System => {
                    system_parts.push(&m.content);
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": m.content }],
            }));
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(json!({ "parts": [{ "text": system_parts.join("\n\n") }] }))
        };

        (system_instruction, contents)
    }

    pub fn build_request(&self, messages: &[Message], options: &GenerationOptions) -> Result<Value> {
        let (system_instruction, contents) = Self::split_messages(messages);
        if contents.is_empty() {
            return Err(Error::validation_with_context(
                "at least one user message is required",
                ErrorContext::new().with_source("gemini_driver"),
            ));
        }

        let mut body = json!({ "contents": contents });
        if let Some(sys) = system_instruction {
            body["system_instruction"] = sys;
        }

        let mut gen_config = json!({});
        if let Some(t) = options.temperature {
            gen_config["temperature"] = json!(t);
        }
        if let Some(mt) = options.max_output_tokens {
            gen_config["maxOutputTokens"] = json!(mt);
        }
        if options.json_output {
            gen_config["response_mime_type"] = json!("application/json");
        }
        if gen_config != json!({}) {
            body["generationConfig"] = gen_config;
        }

        Ok(body)
    }

    pub fn parse_response(&self, body: &Value) -> Result<DriverResponse> {
        // { candidates: [{ content: { parts: [{text: "..."}] }, finishReason }], usageMetadata }
        let content = body
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .filter(|s| !s.is_empty());

        let finish_reason = body
            .pointer("/candidates/0/finishReason")
            .and_then(|v| v.as_str())
            .map(|r| match r {
                "STOP" => "stop".to_string(),
                "MAX_TOKENS" => "length".to_string(),
                "SAFETY" | "RECITATION" => "content_filter".to_string(),
                other => other.to_lowercase(),
            });

        let usage = body.get("usageMetadata").map(|u| UsageInfo {
            prompt_tokens: u["promptTokenCount"].as_u64().unwrap_or(0),
            completion_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0),
            total_tokens: u["totalTokenCount"].as_u64().unwrap_or(0),
        });

        Ok(DriverResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

fn strip_models_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

/// [`TextGenerator`] backed by the hosted Gemini API.
pub struct GeminiClient {
    transport: HttpTransport,
    driver: GeminiDriver,
    model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url, api_key, timeout)?,
            driver: GeminiDriver::new(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, messages: &[Message], options: &GenerationOptions) -> Result<String> {
        let body = self.driver.build_request(messages, options)?;
        let raw = self
            .transport
            .post_json(&GeminiDriver::generate_path(&self.model), &body)
            .await?;
        let resp = self.driver.parse_response(&raw)?;
        if let Some(usage) = resp.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "generateContent usage"
            );
        }
        resp.content.ok_or_else(|| {
            Error::runtime_with_context(
                "model returned no text",
                ErrorContext::new()
                    .with_source("gemini")
                    .with_details(format!(
                        "finish_reason={}",
                        resp.finish_reason.as_deref().unwrap_or("unknown")
                    )),
            )
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
