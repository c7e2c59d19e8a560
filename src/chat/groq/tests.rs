use super::*;
use crate::chat::ChatMessage;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GroqClient {
    let mut config = Config::default();
    config.completion.base_url = format!("{}/openai/v1", server.uri());
    config.completion.api_key = Some("gsk_test".to_string());
    GroqClient::new(&config).expect("should create client")
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "llama3-8b-8192".to_string(),
        messages: vec![ChatMessage::user("What is Rust?")],
        temperature: 0.7,
        max_tokens: Some(1024),
        top_p: None,
    }
}

async fn complete(client: GroqClient) -> Result<String, CompletionError> {
    tokio::task::spawn_blocking(move || client.complete(&request()))
        .await
        .expect("task should not panic")
}

#[test]
fn endpoint_trims_trailing_slash() {
    let mut config = Config::default();
    config.completion.base_url = "https://api.groq.com/openai/v1/".to_string();
    config.completion.api_key = Some("k".to_string());
    let client = GroqClient::new(&config).expect("should create client");
    assert_eq!(client.endpoint, "https://api.groq.com/openai/v1/chat/completions");
}

#[tokio::test(flavor = "multi_thread")]
async fn returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("Authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": "llama3-8b-8192",
            "messages": [{"role": "user", "content": "What is Rust?"}],
            "max_tokens": 1024
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "A systems language."}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = complete(client_for(&server)).await.expect("should complete");
    assert_eq!(answer, "A systems language.");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = complete(client_for(&server)).await;
    assert!(matches!(result, Err(CompletionError::EmptyResponse)));
}

#[tokio::test(flavor = "multi_thread")]
async fn service_error_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    match complete(client_for(&server)).await {
        Err(CompletionError::Service { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.completion.base_url = format!("{}/openai/v1", server.uri());
    config.completion.api_key = Some("gsk_test".to_string());
    config.completion.request_timeout_secs = 1;
    let client = GroqClient::new(&config).expect("should create client");

    let result = complete(client).await;
    assert!(matches!(result, Err(CompletionError::Timeout(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_transport_error() {
    // Reserve a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind");
    let address = listener.local_addr().expect("should have address");
    drop(listener);

    let mut config = Config::default();
    config.completion.base_url = format!("http://{}/openai/v1", address);
    config.completion.api_key = Some("gsk_test".to_string());
    let client = GroqClient::new(&config).expect("should create client");

    let result = complete(client).await;
    assert!(matches!(result, Err(CompletionError::Transport(_))));
}
