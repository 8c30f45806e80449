//! Remote failures: classification, retry and what stays out of the cache.

use crate::mock_server::{MockServerFixture, GENERATE_PATH};
use supplychain_assistant::{Counter, Error};

#[tokio::test]
async fn test_server_error_is_retried_then_surfaced() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let mock = fixture
        .mock_error_response(GENERATE_PATH, 503, "The model is overloaded.", 2)
        .await;
    let assistant = fixture.assistant();

    let err = assistant.plan_reorder("85123A").await.unwrap_err();
    match &err {
        Error::Remote {
            status,
            class,
            message,
            retryable,
        } => {
            assert_eq!(*status, 503);
            assert_eq!(class, "overloaded");
            assert_eq!(message, "The model is overloaded.");
            assert!(*retryable);
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    mock.assert_async().await;

    let summary = assistant.performance_summary();
    assert_eq!(summary.counter(Counter::ApiCalls), 2);
    assert_eq!(summary.counter(Counter::ApiFailures), 2);
    assert_eq!(summary.counter(Counter::Retries), 1);
    assert_eq!(assistant.cache_stats().inserts, 0);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let mock = fixture
        .mock_error_response(GENERATE_PATH, 400, "Invalid JSON payload.", 1)
        .await;
    let assistant = fixture.assistant();

    let err = assistant.ask("What is EOQ?").await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("invalid_request"));
    mock.assert_async().await;
    assert_eq!(assistant.performance_summary().counter(Counter::Retries), 0);
}

#[tokio::test]
async fn test_auth_failure_classified() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    fixture
        .mock_error_response(GENERATE_PATH, 403, "API key not valid.", 1)
        .await;
    let assistant = fixture.assistant();

    match assistant.ask("What is EOQ?").await.unwrap_err() {
        Error::Remote { class, .. } => assert_eq!(class, "authentication"),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_plan_is_not_cached() {
    let fixture = MockServerFixture::new().await;
    fixture.mock_embeddings(2).await;
    let mock = fixture
        .mock_generate("I would reorder roughly a hundred units.", 2)
        .await;
    let assistant = fixture.assistant();

    for _ in 0..2 {
        let err = assistant.plan_reorder("71053").await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
    mock.assert_async().await;
    assert_eq!(assistant.cache_stats().hits, 0);
}
