//! Retrieval-augmented context lookup.
//!
//! A small document corpus is embedded once (lazily, on the first query) and
//! searched by vector similarity; the best matches are pasted into prompts.

mod documents;
mod index;
mod knowledge;

pub use documents::{default_documents, load_documents_dir, Document};
pub use index::{RetrievedDocument, VectorIndex};
pub use knowledge::{EmbedderHandle, KnowledgeBase};
