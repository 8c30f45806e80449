//! The supply chain assistant: dataset, knowledge base, model and cache wired together.
//!
//! ```rust,no_run
//! use supplychain_assistant::{AssistantConfig, SupplyChainAssistant};
//!
//! #[tokio::main]
//! async fn main() -> supplychain_assistant::Result<()> {
//!     let config = AssistantConfig::load("assistant.yaml")?;
//!     let assistant = SupplyChainAssistant::builder().config(config).build()?;
//!
//!     let plan = assistant.plan_reorder("85123A").await?;
//!     println!("order {} units at {}", plan.reorder_quantity, plan.reorder_point);
//!     println!("{}", assistant.performance_summary());
//!     Ok(())
//! }
//! ```

mod builder;
mod core;

pub use builder::AssistantBuilder;
pub use core::{Answer, BatchPlan, SupplyChainAssistant};
