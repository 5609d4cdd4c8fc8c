//! Integration tests for the OpenAI price source
//!
//! Runs the client against a local axum server that imitates the chat
//! completions endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use fleetfuel::data::{OpenAiClient, OpenAiConfig, Period, PriceSource, SourceError};
use serde_json::{json, Value};

/// Scripted behavior of the fake endpoint
#[derive(Clone, Copy)]
enum Script {
    /// Answer with the given assistant content
    Content(&'static str),
    /// Fail with this status on the first request, then answer normally
    FailOnceWith(u16),
    /// Always fail with this status
    AlwaysFail(u16),
    /// Answer after a delay
    Slow(Duration),
}

struct FakeApi {
    script: Script,
    hits: AtomicUsize,
    last_request: std::sync::Mutex<Option<(HeaderMap, Value)>>,
}

async fn completions(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let hit = api.hits.fetch_add(1, Ordering::SeqCst);
    *api.last_request.lock().unwrap() = Some((headers, body));

    let ok = |content: &str| {
        (
            StatusCode::OK,
            Json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
                ]
            })),
        )
    };
    let fail = |status: u16| {
        (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({"error": {"message": "scripted failure"}})),
        )
    };

    match api.script {
        Script::Content(content) => ok(content),
        Script::FailOnceWith(status) if hit == 0 => fail(status),
        Script::FailOnceWith(_) => ok(r#"{"price": 560}"#),
        Script::AlwaysFail(status) => fail(status),
        Script::Slow(delay) => {
            tokio::time::sleep(delay).await;
            ok(r#"{"price": 560}"#)
        }
    }
}

/// Starts the fake API and returns its base URL
async fn start_fake_api(script: Script) -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi {
        script,
        hits: AtomicUsize::new(0),
        last_request: std::sync::Mutex::new(None),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), api)
}

fn client(base_url: String, timeout: Duration, max_retries: u32) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig {
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o".to_string(),
        base_url,
        timeout,
        max_retries,
    })
    .unwrap()
}

fn march_2025() -> Period {
    Period::new(2025, 3).unwrap()
}

#[tokio::test]
async fn test_returns_assistant_content() {
    let (base_url, api) = start_fake_api(Script::Content(r#"{"price": 512.3}"#)).await;
    let client = client(base_url, Duration::from_secs(5), 0);

    let content = client.request_price(&march_2025()).await.unwrap();

    assert_eq!(content, r#"{"price": 512.3}"#);
    assert_eq!(api.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sends_bearer_token_and_json_mode() {
    let (base_url, api) = start_fake_api(Script::Content(r#"{"price": 512}"#)).await;
    let client = client(base_url, Duration::from_secs(5), 0);

    client.request_price(&march_2025()).await.unwrap();

    let guard = api.last_request.lock().unwrap();
    let (headers, body) = guard.as_ref().expect("request should be recorded");
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["response_format"]["type"], "json_object");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("March 2025"), "prompt: {prompt}");
}

#[tokio::test]
async fn test_retries_rate_limit_once() {
    let (base_url, api) = start_fake_api(Script::FailOnceWith(429)).await;
    let client = client(base_url, Duration::from_secs(5), 1);

    let content = client.request_price(&march_2025()).await.unwrap();

    assert_eq!(content, r#"{"price": 560}"#);
    assert_eq!(api.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let (base_url, api) = start_fake_api(Script::AlwaysFail(503)).await;
    let client = client(base_url, Duration::from_secs(5), 2);

    let err = client.request_price(&march_2025()).await.unwrap_err();

    assert!(matches!(err, SourceError::HttpStatus { status: 503, .. }));
    assert_eq!(api.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let (base_url, api) = start_fake_api(Script::AlwaysFail(401)).await;
    let client = client(base_url, Duration::from_secs(5), 3);

    let err = client.request_price(&march_2025()).await.unwrap_err();

    assert!(matches!(err, SourceError::HttpStatus { status: 401, .. }));
    assert_eq!(api.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let (base_url, _api) = start_fake_api(Script::Slow(Duration::from_secs(2))).await;
    let client = client(base_url, Duration::from_millis(200), 0);

    let err = client.request_price(&march_2025()).await.unwrap_err();

    assert!(matches!(err, SourceError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_service_is_request_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(format!("http://{addr}/v1"), Duration::from_secs(2), 0);

    let err = client.request_price(&march_2025()).await.unwrap_err();

    assert!(matches!(err, SourceError::Request(_)), "got {err:?}");
}
