//! GeminiClient against a mock generateContent endpoint.

use crate::mock_server::{generate_body, MockServerFixture, API_KEY, GENERATE_PATH};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;
use supplychain_assistant::drivers::{GeminiClient, GenerationOptions, TextGenerator};
use supplychain_assistant::Message;

fn client(fixture: &MockServerFixture) -> GeminiClient {
    GeminiClient::new(
        fixture.base_url.clone(),
        Some(API_KEY.to_string()),
        "gemini-1.5-flash",
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_generate_sends_system_instruction_and_config() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", API_KEY)
            .match_body(Matcher::PartialJson(json!({
                "system_instruction": { "parts": [{ "text": "Be brief." }] },
                "contents": [{ "role": "user", "parts": [{ "text": "Hi" }] }],
                "generationConfig": { "response_mime_type": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(generate_body("{\"ok\": true}").to_string())
            .expect(1)
            .create_async()
            .await
    };

    let text = client(&fixture)
        .generate(
            &[Message::system("Be brief."), Message::user("Hi")],
            &GenerationOptions::default().json(),
        )
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\": true}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_multi_part_reply_is_joined() {
    let fixture = MockServerFixture::new().await;
    let body = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "Order " }, { "text": "early." }] },
            "finishReason": "STOP"
        }]
    });
    let mock = fixture.mock_json(GENERATE_PATH, 200, body, 1).await;

    let text = client(&fixture)
        .generate(&[Message::user("When?")], &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "Order early.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_blocked_reply_reports_finish_reason() {
    let fixture = MockServerFixture::new().await;
    let body = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
    fixture.mock_json(GENERATE_PATH, 200, body, 1).await;

    let err = client(&fixture)
        .generate(&[Message::user("x")], &GenerationOptions::default())
        .await
        .unwrap_err();
    let details = err.context().and_then(|c| c.details.clone()).unwrap_or_default();
    assert!(details.contains("content_filter"), "{details}");
}
