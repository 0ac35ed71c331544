// Tests for the OpenAI icebreaker service against a mock API

use leadsift_core::icebreaker::{GENERATION_ERROR, IcebreakerService};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn service(server: &MockServer) -> IcebreakerService {
    IcebreakerService::new("sk-test")
        .with_base_url(server.uri())
        .with_min_interval(Duration::ZERO)
        .with_backoff_unit(Duration::from_millis(10))
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

// ============================================================================
// Generation Tests
// ============================================================================

#[tokio::test]
async fn test_one_liner_request_and_trim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-3.5-turbo", "max_tokens": 150 })))
        .respond_with(completion(
            "  Hey Ada, I love the mission you're on regarding fair coffee.\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let text = service(&server)
        .generate_one_liner(Some("We pay farmers fairly."), Some("Ada"))
        .await;

    assert_eq!(text, "Hey Ada, I love the mission you're on regarding fair coffee.");
}

#[tokio::test]
async fn test_summary_uses_its_own_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "max_tokens": 200 })))
        .respond_with(completion("Roastery sources and roasts coffee."))
        .expect(1)
        .mount(&server)
        .await;

    let summary = service(&server)
        .generate_about_summary(Some("We roast coffee."))
        .await;
    assert_eq!(summary, "Roastery sources and roasts coffee.");
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let ai = service(&server);
    assert_eq!(ai.generate_one_liner(Some("copy"), None).await, GENERATION_ERROR);
    assert_eq!(ai.generate_about_summary(Some("copy")).await, "");
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(completion("Hey, I love the mission you're on regarding tea."))
        .mount(&server)
        .await;

    let text = service(&server).generate_one_liner(Some("We sell tea."), None).await;
    assert_eq!(text, "Hey, I love the mission you're on regarding tea.");
}

#[tokio::test]
async fn test_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let text = service(&server).generate_one_liner(Some("copy"), None).await;
    assert_eq!(text, GENERATION_ERROR);
}

#[tokio::test]
async fn test_min_interval_spaces_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let ai = service(&server).with_min_interval(Duration::from_millis(300));
    let start = Instant::now();
    ai.generate_about_summary(Some("a")).await;
    ai.clone().generate_about_summary(Some("b")).await;

    assert!(start.elapsed() >= Duration::from_millis(300));
}
