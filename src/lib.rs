//! # supplychain-assistant
//!
//! A supply chain planning assistant on top of the hosted Gemini API.
//!
//! ## Overview
//!
//! The assistant answers inventory questions and produces reorder plans for
//! individual products. Each request combines three inputs: a CSV demand
//! history, playbook excerpts retrieved by embedding similarity, and a prompt
//! template. The runtime around the model calls keeps them cheap and observable:
//!
//! - **Memoized calls**: responses are cached in an LRU keyed by a fingerprint
//!   of the normalized query and the data snapshot
//! - **Lazy embedding model**: the embedding client and document index are
//!   built on first use, once
//! - **Batch planning**: a sequential loop over product ids that keeps going
//!   past individual failures
//! - **Performance monitor**: counters and timers for API calls, cache hits
//!   and misses, embeddings and retries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use supplychain_assistant::{AssistantConfig, SupplyChainAssistant};
//!
//! #[tokio::main]
//! async fn main() -> supplychain_assistant::Result<()> {
//!     let mut config = AssistantConfig::from_env()?;
//!     config.data_path = Some("data/online_retail.csv".into());
//!
//!     let assistant = SupplyChainAssistant::builder().config(config).build()?;
//!     let batch = assistant.plan_batch(&["85123A", "71053"]).await;
//!     for (id, plan) in &batch.plans {
//!         println!("{id}: reorder {} at {}", plan.reorder_quantity, plan.reorder_point);
//!     }
//!     println!("{}", assistant.performance_summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`assistant`] | The [`SupplyChainAssistant`] façade and its builder |
//! | [`cache`] | Response cache, cache keys and backends |
//! | [`lazy`] | Construct-on-first-use resource handle |
//! | [`batch`] | Sequential batch executor |
//! | [`monitor`] | Counters and timers |
//! | [`data`] | CSV demand history |
//! | [`retrieval`] | Documents, vector index and knowledge base |
//! | [`embeddings`] | Embedding client and vector math |
//! | [`drivers`] | Gemini text generation |
//! | [`structured`] | Reorder plan schema and parsing |
//! | [`resilience`] | Fixed-delay retry |
//! | [`config`] | YAML and environment configuration |

pub mod assistant;
pub mod batch;
pub mod cache;
pub mod config;
pub mod data;
pub mod drivers;
pub mod embeddings;
pub mod lazy;
pub mod monitor;
pub mod prompts;
pub mod resilience;
pub mod retrieval;
pub mod structured;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use assistant::{Answer, AssistantBuilder, BatchPlan, SupplyChainAssistant};
pub use config::AssistantConfig;
pub use data::{DemandDataset, DemandRecord};
pub use monitor::{Counter, PerformanceMonitor, PerformanceSummary};
pub use structured::ReorderPlan;
pub use types::{Message, MessageRole};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
