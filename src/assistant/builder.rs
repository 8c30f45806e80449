use std::sync::Arc;
use std::time::Duration;

use super::core::SupplyChainAssistant;
use crate::batch::BatchExecutor;
use crate::cache::{CacheKeyGenerator, ResponseCache};
use crate::config::AssistantConfig;
use crate::data::DemandDataset;
use crate::drivers::{GeminiClient, GenerationOptions, TextGenerator};
use crate::embeddings::{Embedder, EmbeddingClient};
use crate::lazy::LazyResource;
use crate::monitor::PerformanceMonitor;
use crate::resilience::RetryPolicy;
use crate::retrieval::{default_documents, load_documents_dir, Document, EmbedderHandle, KnowledgeBase};
use crate::{Error, ErrorContext, Result};

/// Builder for [`SupplyChainAssistant`].
///
/// Anything not set explicitly comes from the [`AssistantConfig`]: the dataset
/// from `data_path`, documents from `documents_dir` (or the built-in playbook),
/// and Gemini clients from the model settings.
pub struct AssistantBuilder {
    config: AssistantConfig,
    dataset: Option<DemandDataset>,
    documents: Option<Vec<Document>>,
    generator: Option<Arc<dyn TextGenerator>>,
    embedder: Option<Arc<dyn Embedder>>,
    monitor: Option<Arc<PerformanceMonitor>>,
    retry: Option<RetryPolicy>,
    api_key: Option<String>,
    cache_enabled: bool,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self {
            config: AssistantConfig::default(),
            dataset: None,
            documents: None,
            generator: None,
            embedder: None,
            monitor: None,
            retry: None,
            api_key: None,
            cache_enabled: true,
            base_url_override: None,
        }
    }

    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dataset(mut self, dataset: DemandDataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Use this text generator instead of building a Gemini client.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use this embedder instead of lazily building a Gemini embedding client.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Share a monitor with other components.
    pub fn monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Every call goes to the model.
    pub fn disable_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<SupplyChainAssistant> {
        let mut config = self.config;
        if let Some(url) = self.base_url_override {
            config.base_url = url;
        }
        config.validate()?;

        let monitor = self
            .monitor
            .unwrap_or_else(|| Arc::new(PerformanceMonitor::new()));

        let dataset = match (self.dataset, &config.data_path) {
            (Some(ds), _) => ds,
            (None, Some(path)) => DemandDataset::from_path(path)?,
            (None, None) => DemandDataset::default(),
        };

        let documents = match (self.documents, &config.documents_dir) {
            (Some(docs), _) => docs,
            (None, Some(dir)) => load_documents_dir(dir)?,
            (None, None) => default_documents(),
        };

        let needs_key = self.generator.is_none() || self.embedder.is_none();
        let api_key = match self.api_key {
            Some(key) => Some(key),
            None if needs_key => config.resolve_api_key(),
            None => None,
        };
        if needs_key && api_key.is_none() {
            return Err(Error::configuration_with_context(
                "no Gemini API key found",
                ErrorContext::new()
                    .with_field_path("api_key")
                    .with_details("set api_key, store one in the OS keyring, or export GEMINI_API_KEY")
                    .with_source("assistant_builder"),
            ));
        }

        let generator: Arc<dyn TextGenerator> = match self.generator {
            Some(g) => g,
            None => Arc::new(GeminiClient::new(
                config.base_url.clone(),
                api_key.clone(),
                config.model.clone(),
                config.timeout(),
            )?),
        };

        let embedder: EmbedderHandle = match self.embedder {
            Some(e) => Arc::new(LazyResource::ready("embedding_model", e)),
            None => lazy_embedder(&config, api_key),
        };

        let cache = if self.cache_enabled {
            ResponseCache::lru(config.cache_capacity()?)
        } else {
            ResponseCache::disabled()
        }
        .with_monitor(monitor.clone());

        let options = GenerationOptions::default()
            .with_temperature(config.temperature)
            .with_max_output_tokens(config.max_output_tokens);

        Ok(SupplyChainAssistant {
            generator,
            knowledge: KnowledgeBase::new(documents, embedder, monitor.clone()),
            dataset,
            cache,
            keys: CacheKeyGenerator::new(),
            retry: self.retry.unwrap_or_else(|| config.retry_policy()),
            batch: BatchExecutor::new(),
            options,
            top_k: config.retrieval_top_k,
            monitor,
        })
    }
}

impl Default for AssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Embedding client constructed on first retrieval.
fn lazy_embedder(config: &AssistantConfig, api_key: Option<String>) -> EmbedderHandle {
    let model = config.embedding_model.clone();
    let base_url = config.base_url.clone();
    let timeout: Duration = config.timeout();
    Arc::new(LazyResource::new("embedding_model", move || {
        let builder = EmbeddingClient::builder()
            .model(model.clone())
            .base_url(base_url.clone())
            .api_key(api_key.clone())
            .timeout(timeout);
        async move { Ok(Arc::new(builder.build()?) as Arc<dyn Embedder>) }
    }))
}
