//! Mock Gemini server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use supplychain_assistant::resilience::RetryPolicy;
use supplychain_assistant::retrieval::Document;
use supplychain_assistant::{AssistantConfig, DemandDataset, SupplyChainAssistant};
use tokio::sync::Mutex;

pub const API_KEY: &str = "test-key";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
pub const EMBED_PATH: &str = "/v1beta/models/text-embedding-004:embedContent";
pub const BATCH_EMBED_PATH: &str = "/v1beta/models/text-embedding-004:batchEmbedContents";

pub const DEMAND_CSV: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom
536366,85123A,WHITE HANGING HEART T-LIGHT HOLDER,10,12/3/2010 9:00,2.55,17850,United Kingdom
536367,71053,WHITE METAL LANTERN,6,12/1/2010 8:26,3.39,17850,United Kingdom
536368,22633,HAND WARMER UNION JACK,12,12/2/2010 10:03,1.85,17851,France
";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Assistant pointed at the mock server, two playbook documents, no retry delay.
    pub fn assistant(&self) -> SupplyChainAssistant {
        let config = AssistantConfig {
            cache_capacity: 16,
            ..AssistantConfig::default()
        };
        SupplyChainAssistant::builder()
            .config(config)
            .base_url_override(&self.base_url)
            .api_key(API_KEY)
            .dataset(DemandDataset::from_reader(DEMAND_CSV.as_bytes()).unwrap())
            .documents(vec![
                Document::new("safety-stock", "Safety stock", "Hold a buffer against variability."),
                Document::new("lead-time", "Lead time", "Domestic suppliers take seven days."),
            ])
            .retry_policy(RetryPolicy::new(2, Duration::ZERO))
            .build()
            .unwrap()
    }

    /// A generateContent reply whose text is `text`, expected `hits` times.
    pub async fn mock_generate(&self, text: &str, hits: usize) -> Mock {
        self.mock_json(GENERATE_PATH, 200, generate_body(text), hits)
            .await
    }

    /// Embedding endpoints returning fixed 3-dimensional vectors.
    pub async fn mock_embeddings(&self, documents: usize) -> (Mock, Mock) {
        let batch = json!({
            "embeddings": (0..documents)
                .map(|i| json!({ "values": [1.0, i as f64, 0.5] }))
                .collect::<Vec<_>>(),
        });
        let single = json!({ "embedding": { "values": [1.0, 0.0, 0.5] } });
        let mut server = self.server.lock().await;
        let batch_mock = server
            .mock("POST", BATCH_EMBED_PATH)
            .match_header("x-goog-api-key", API_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(batch.to_string())
            .create_async()
            .await;
        let single_mock = server
            .mock("POST", EMBED_PATH)
            .match_header("x-goog-api-key", API_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(single.to_string())
            .create_async()
            .await;
        (batch_mock, single_mock)
    }

    /// Create a mock for a JSON response, expected exactly `hits` times.
    pub async fn mock_json(&self, path: &str, status: u16, body: Value, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_header("x-goog-api-key", API_KEY)
            .match_header("content-type", Matcher::Regex("application/json".into()))
            .with_status(status as usize)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock for a Google-style error response
    pub async fn mock_error_response(
        &self,
        path: &str,
        status: u16,
        message: &str,
        hits: usize,
    ) -> Mock {
        let body = json!({
            "error": { "code": status, "message": message, "status": "ERROR" }
        });
        self.mock_json(path, status, body, hits).await
    }
}

pub fn generate_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 120,
            "candidatesTokenCount": 40,
            "totalTokenCount": 160
        }
    })
}

pub fn plan_text(product_id: &str) -> String {
    json!({
        "product_id": product_id,
        "reorder_point": 30,
        "reorder_quantity": 90,
        "safety_stock": 10,
        "lead_time_days": 7,
        "confidence": 0.7,
        "rationale": "About four units a day with a week of lead time."
    })
    .to_string()
}
