//! EmbeddingClient against mock embedContent / batchEmbedContents endpoints.

use crate::mock_server::{MockServerFixture, API_KEY, BATCH_EMBED_PATH, EMBED_PATH};
use mockito::Matcher;
use serde_json::json;
use supplychain_assistant::embeddings::{Embedder, EmbeddingClient};

fn client(fixture: &MockServerFixture, max_batch: usize) -> EmbeddingClient {
    EmbeddingClient::builder()
        .model("text-embedding-004")
        .base_url(fixture.base_url.clone())
        .api_key(Some(API_KEY.to_string()))
        .max_batch_size(max_batch)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_single_embedding() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", EMBED_PATH)
            .match_body(Matcher::PartialJson(json!({
                "model": "models/text-embedding-004",
                "content": { "parts": [{ "text": "safety stock" }] }
            })))
            .with_status(200)
            .with_body(json!({ "embedding": { "values": [0.25, -0.5, 1.0] } }).to_string())
            .expect(1)
            .create_async()
            .await
    };

    let v = client(&fixture, 100).embed("safety stock").await.unwrap();
    assert_eq!(v, vec![0.25, -0.5, 1.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_is_chunked() {
    let fixture = MockServerFixture::new().await;
    let body = json!({
        "embeddings": [{ "values": [1.0, 0.0] }, { "values": [0.0, 1.0] }]
    });
    // 4 texts at 2 per request
    let mock = fixture.mock_json(BATCH_EMBED_PATH, 200, body, 2).await;

    let texts: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let vectors = client(&fixture, 2).embed_batch(&texts).await.unwrap();
    assert_eq!(vectors.len(), 4);
    assert_eq!(vectors[2], vec![1.0, 0.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_count_mismatch_is_error() {
    let fixture = MockServerFixture::new().await;
    let body = json!({ "embeddings": [{ "values": [1.0] }] });
    fixture.mock_json(BATCH_EMBED_PATH, 200, body, 1).await;

    let texts = vec!["a".to_string(), "b".to_string()];
    assert!(client(&fixture, 10).embed_batch(&texts).await.is_err());
}
