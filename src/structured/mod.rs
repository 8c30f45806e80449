//! Structured model output.
//!
//! The model is asked for a bare JSON object, but replies often arrive wrapped
//! in Markdown fences or preceded by a sentence of prose. This module digs the
//! object out, checks it against the JSON Schema derived from [`ReorderPlan`]
//! and only then deserializes it.
//!
//! ```
//! use supplychain_assistant::structured::parse_reorder_plan;
//!
//! let reply = "Here you go:\n```json\n{\"product_id\": \"85123A\", \"reorder_point\": 40, \
//!     \"reorder_quantity\": 120, \"safety_stock\": 15, \"lead_time_days\": 7, \
//!     \"confidence\": 0.8, \"rationale\": \"steady seller\"}\n```";
//! let plan = parse_reorder_plan(reply, "85123A").unwrap();
//! assert_eq!(plan.reorder_quantity, 120);
//! ```

mod extract;
mod plan;

pub use extract::extract_json;
pub use plan::{parse_reorder_plan, reorder_plan_schema, ReorderPlan};
