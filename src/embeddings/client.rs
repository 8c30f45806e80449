//! Embedding client for Gemini `embedContent` / `batchEmbedContents`.

use super::{Embedder, Vector};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct EmbeddingClient {
    transport: HttpTransport,
    model: String,
    max_batch_size: usize,
}

impl EmbeddingClient {
    pub fn builder() -> EmbeddingClientBuilder {
        EmbeddingClientBuilder::new()
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.model.strip_prefix("models/").unwrap_or(&self.model))
    }

    fn content_request(&self, text: &str) -> Value {
        json!({
            "model": self.model_path(),
            "content": { "parts": [{ "text": text }] },
        })
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vector>> {
        let body = json!({
            "requests": chunk.iter().map(|t| self.content_request(t)).collect::<Vec<_>>(),
        });
        let path = format!("/v1beta/{}:batchEmbedContents", self.model_path());
        let json = self.transport.post_json(&path, &body).await?;
        let vectors = json["embeddings"]
            .as_array()
            .ok_or_else(|| missing_field("embeddings"))?
            .iter()
            .map(parse_values)
            .collect::<Result<Vec<_>>>()?;
        if vectors.len() != chunk.len() {
            return Err(Error::runtime_with_context(
                "embedding count does not match input count",
                ErrorContext::new()
                    .with_source("embeddings")
                    .with_details(format!("expected {}, got {}", chunk.len(), vectors.len())),
            ));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vector> {
        let path = format!("/v1beta/{}:embedContent", self.model_path());
        let json = self
            .transport
            .post_json(&path, &self.content_request(text))
            .await?;
        parse_values(&json["embedding"])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch_size) {
            all.extend(self.embed_chunk(chunk).await?);
        }
        Ok(all)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_values(embedding: &Value) -> Result<Vector> {
    embedding["values"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect()
        })
        .ok_or_else(|| missing_field("embedding.values"))
}

fn missing_field(field: &str) -> Error {
    Error::runtime_with_context(
        "malformed embedding response",
        ErrorContext::new()
            .with_field_path(field)
            .with_source("embeddings"),
    )
}

pub struct EmbeddingClientBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    max_batch_size: usize,
    timeout: Duration,
}

impl EmbeddingClientBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            max_batch_size: 100,
            timeout: Duration::from_secs(60),
        }
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.max_batch_size = n.max(1);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<EmbeddingClient> {
        let model = self
            .model
            .ok_or_else(|| Error::configuration("Embedding model must be specified"))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| crate::config::DEFAULT_BASE_URL.to_string());
        Ok(EmbeddingClient {
            transport: HttpTransport::new(base_url, self.api_key, self.timeout)?,
            model,
            max_batch_size: self.max_batch_size,
        })
    }
}

impl Default for EmbeddingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_model() {
        assert!(matches!(
            EmbeddingClient::builder().build(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_content_request_shape() {
        let client = EmbeddingClient::builder()
            .model("text-embedding-004")
            .build()
            .unwrap();
        let req = client.content_request("lead time");
        assert_eq!(req["model"], "models/text-embedding-004");
        assert_eq!(req["content"]["parts"][0]["text"], "lead time");
    }

    #[test]
    fn test_parse_values() {
        let v = json!({"values": [0.5, -1.0, 2]});
        assert_eq!(parse_values(&v).unwrap(), vec![0.5, -1.0, 2.0]);
        assert!(parse_values(&json!({})).is_err());
    }
}
