use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }

    /// Text sent to the embedding model.
    pub fn embedding_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.text)
    }
}

/// Built-in inventory playbook used when no document directory is configured.
pub fn default_documents() -> Vec<Document> {
    vec![
        Document::new(
            "reorder-point",
            "Reorder point",
            "Place a replenishment order when on-hand plus on-order stock falls to the reorder point. \
             Reorder point = average daily demand x supplier lead time in days + safety stock. \
             Recompute it whenever demand or lead time shifts materially.",
        ),
        Document::new(
            "safety-stock",
            "Safety stock",
            "Safety stock buffers demand and lead-time variability. A common rule is \
             z x standard deviation of daily demand x sqrt(lead time days), with z = 1.65 for a \
             95% cycle service level. When variability data is thin, hold 50% of lead-time demand \
             for volatile items and 20-30% for steady sellers.",
        ),
        Document::new(
            "eoq",
            "Economic order quantity",
            "EOQ balances ordering cost against holding cost: EOQ = sqrt(2 x annual demand x cost per \
             order / annual holding cost per unit). Round the result up to the supplier's case pack \
             and respect minimum order quantities.",
        ),
        Document::new(
            "lead-time",
            "Supplier lead time",
            "Default planning lead time for domestic suppliers is 7 days and 21-30 days for overseas \
             freight. Track actual receipt dates; if observed lead times drift, update reorder \
             points before the next cycle rather than waiting for a stockout.",
        ),
        Document::new(
            "seasonality",
            "Seasonality and promotions",
            "Gift and home-decor lines peak from September through December. Build inventory ahead \
             of the peak using last year's weekly profile, and treat promotion-driven spikes as \
             one-off demand rather than a new baseline.",
        ),
        Document::new(
            "abc-analysis",
            "ABC classification",
            "Rank products by revenue: A items (top ~20% of SKUs, ~80% of revenue) get weekly review \
             and higher service levels; B items monthly review; C items can run on larger, less \
             frequent orders with minimal safety stock.",
        ),
        Document::new(
            "returns",
            "Returns and cancellations",
            "Negative quantities in sales history are returns or cancelled invoices. Exclude them \
             from demand forecasts but monitor the return rate; above 10% indicates a quality or \
             listing problem that should be fixed before reordering more.",
        ),
        Document::new(
            "supplier-risk",
            "Supplier risk",
            "For single-sourced A items keep an extra week of cover and qualify a second supplier. \
             Split large orders across deliveries when the supplier's on-time rate is below 90%.",
        ),
    ]
}

/// Load every `.md` / `.txt` file in `dir` (sorted by file name) as a document.
///
/// The title is the first Markdown heading, or the file stem when there is none.
pub fn load_documents_dir(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::configuration_with_context(
            format!("cannot read documents directory: {}", e),
            ErrorContext::new()
                .with_details(dir.display().to_string())
                .with_source("knowledge_base"),
        )
    })?;

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            )
        })
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let title = text
            .lines()
            .find_map(|l| l.strip_prefix('#').map(|t| t.trim_start_matches('#').trim()))
            .filter(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(|| stem.clone());
        docs.push(Document::new(stem, title, text.trim()));
    }
    Ok(docs)
}
