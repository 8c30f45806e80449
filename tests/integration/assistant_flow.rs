//! End-to-end assistant flows against the mock Gemini server.

use crate::mock_server::{plan_text, MockServerFixture};
use supplychain_assistant::Counter;

#[tokio::test]
async fn test_plan_reorder_is_memoized() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let generate = fixture.mock_generate(&plan_text("85123A"), 1).await;
    let assistant = fixture.assistant();

    let first = assistant.plan_reorder("85123A").await.unwrap();
    let second = assistant.plan_reorder("85123A").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.reorder_quantity, 90);
    generate.assert_async().await;

    let summary = assistant.performance_summary();
    assert_eq!(summary.counter(Counter::ApiCalls), 1);
    assert_eq!(summary.counter(Counter::CacheHits), 1);
    assert_eq!(summary.counter(Counter::CacheMisses), 1);
    // 2 documents indexed + 1 query
    assert_eq!(summary.counter(Counter::EmbeddingCalls), 3);
    assert!(assistant.knowledge().is_indexed());
}

#[tokio::test]
async fn test_plan_batch_returns_one_entry_per_id() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    // product_id in the reply is repaired to each requested id
    let generate = fixture.mock_generate(&plan_text("85123A"), 3).await;
    let assistant = fixture.assistant();

    let ids = ["85123A", "71053", "22633"];
    let batch = assistant.plan_batch(&ids).await;
    assert!(batch.is_complete());
    assert_eq!(batch.plans.len(), ids.len());
    for id in ids {
        assert_eq!(batch.plans[id].product_id, id);
    }
    generate.assert_async().await;
}

#[tokio::test]
async fn test_plan_batch_reports_unknown_ids() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let generate = fixture.mock_generate(&plan_text("71053"), 1).await;
    let assistant = fixture.assistant();

    let batch = assistant.plan_batch(&["71053", "NOT-A-SKU"]).await;
    assert_eq!(batch.plans.len(), 1);
    assert_eq!(batch.failures.len(), 1);
    assert!(batch.failures.contains_key("NOT-A-SKU"));
    generate.assert_async().await;
}

#[tokio::test]
async fn test_ask_returns_sources_and_caches() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let generate = fixture
        .mock_generate("Keep about **one week** of cover [1].", 1)
        .await;
    let assistant = fixture.assistant();

    let answer = assistant.ask("How much safety stock do I need?").await.unwrap();
    assert!(!answer.cached);
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.text.contains("one week"));

    let again = assistant.ask("How much safety stock do I need?").await.unwrap();
    assert!(again.cached);
    assert_eq!(again.sources, answer.sources);
    generate.assert_async().await;
    assert_eq!(assistant.cache_stats().hit_ratio(), 0.5);
}
