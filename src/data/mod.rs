//! Historical demand data loaded from CSV.
//!
//! Records are read wholesale into memory and never mutated; every query is a
//! filter or aggregation over the loaded rows.

mod dataset;
mod record;

pub use dataset::{normalize_code, DemandDataset, LoadReport, ProductSummary};
pub use record::{parse_timestamp, DemandRecord};
