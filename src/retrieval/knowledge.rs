use std::sync::Arc;
use tracing::debug;

use super::documents::Document;
use super::index::{RetrievedDocument, VectorIndex};
use crate::embeddings::{Embedder, SimilarityMetric};
use crate::lazy::LazyResource;
use crate::monitor::{Counter, PerformanceMonitor};
use crate::Result;

/// Shared, lazily constructed embedding model.
pub type EmbedderHandle = Arc<LazyResource<Arc<dyn Embedder>>>;

/// Document corpus plus its lazily built vector index.
pub struct KnowledgeBase {
    documents: Arc<Vec<Document>>,
    embedder: EmbedderHandle,
    index: LazyResource<VectorIndex>,
    metric: SimilarityMetric,
    monitor: Arc<PerformanceMonitor>,
}

impl KnowledgeBase {
    pub fn new(
        documents: Vec<Document>,
        embedder: EmbedderHandle,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        let documents = Arc::new(documents);
        let index = {
            let documents = documents.clone();
            let embedder = embedder.clone();
            let monitor = monitor.clone();
            LazyResource::new("document_index", move || {
                let documents = documents.clone();
                let embedder = embedder.clone();
                let monitor = monitor.clone();
                async move {
                    let model = embedder.get().await?;
                    let texts: Vec<String> =
                        documents.iter().map(|d| d.embedding_text()).collect();
                    let vectors = {
                        let _t = monitor.time("embedding");
                        model.embed_batch(&texts).await?
                    };
                    monitor.add(Counter::EmbeddingCalls, texts.len() as u64);
                    VectorIndex::from_pairs(documents.as_ref().clone(), vectors)
                }
            })
        };

        Self {
            documents,
            embedder,
            index,
            metric: SimilarityMetric::Cosine,
            monitor,
        }
    }

    /// Knowledge base around an already constructed embedder.
    pub fn with_embedder(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self::new(
            documents,
            Arc::new(LazyResource::ready("embedding_model", embedder)),
            monitor,
        )
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_initialized()
    }

    /// Top `k` documents for `query`. The corpus is embedded on the first call.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if self.documents.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let _t = self.monitor.time("retrieval");
        let index = self.index.get().await?;
        let model = self.embedder.get().await?;
        let query_vec = {
            let _t = self.monitor.time("embedding");
            model.embed(query).await?
        };
        self.monitor.incr(Counter::EmbeddingCalls);
        let hits = index.search(&query_vec, k, self.metric)?;
        debug!(
            query_len = query.len(),
            hits = hits.len(),
            top = hits.first().map(|h| h.document.id.as_str()).unwrap_or("-"),
            "retrieved context"
        );
        Ok(hits)
    }
}
