use serde::Serialize;

use super::documents::Document;
use crate::embeddings::{find_most_similar, SimilarityMetric, Vector};
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub document: Document,
    pub score: f32,
}

/// Flat in-memory vector index; search is an exhaustive scan.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    documents: Vec<Document>,
    vectors: Vec<Vector>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(documents: Vec<Document>, vectors: Vec<Vector>) -> Result<Self> {
        if documents.len() != vectors.len() {
            return Err(Error::validation_with_context(
                "documents and vectors differ in length",
                ErrorContext::new()
                    .with_details(format!("{} documents, {} vectors", documents.len(), vectors.len()))
                    .with_source("vector_index"),
            ));
        }
        let mut index = Self::new();
        for (doc, v) in documents.into_iter().zip(vectors) {
            index.insert(doc, v)?;
        }
        Ok(index)
    }

    pub fn insert(&mut self, document: Document, vector: Vector) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::validation_with_context(
                "empty embedding",
                ErrorContext::new().with_field_path(document.id.clone()),
            ));
        }
        if let Some(dims) = self.dimensions() {
            if dims != vector.len() {
                return Err(Error::validation_with_context(
                    format!("embedding has {} dimensions, index has {}", vector.len(), dims),
                    ErrorContext::new()
                        .with_field_path(document.id.clone())
                        .with_source("vector_index"),
                ));
            }
        }
        self.documents.push(document);
        self.vectors.push(vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.vectors.first().map(|v| v.len())
    }

    /// Best `k` documents for `query`, best first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<RetrievedDocument>> {
        match self.dimensions() {
            None => return Ok(Vec::new()),
            Some(dims) if dims != query.len() => {
                return Err(Error::validation(format!(
                    "query has {} dimensions, index has {}",
                    query.len(),
                    dims
                )))
            }
            Some(_) => {}
        }
        Ok(find_most_similar(query, &self.vectors, k, metric)
            .into_iter()
            .map(|r| RetrievedDocument {
                document: self.documents[r.index].clone(),
                score: r.score,
            })
            .collect())
    }
}
