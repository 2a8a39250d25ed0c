use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use gateway::{generate_pair, GenerationGateway, HttpGatewayConfig, HttpGenerationGateway};
use serde_json::{json, Value};
use shared::{
    domain::{ImageArtifact, Style, UserImage},
    error::GenerationStage,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    call: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn handle_generate(
    State(state): State<ServerState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().await.push(RecordedRequest {
        call: call.clone(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let model = call.split(':').next().unwrap_or_default();
    match model {
        "image-ok" => Json(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your picture"},
                    {"inlineData": {"mimeType": "image/png", "data": "c3R5bGVk"}}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        "caption-ok" => Json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "  Neon dreams, "}, {"text": "chrome hearts.  "}]},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        "overloaded" => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}})),
        )
            .into_response(),
        "bare-error" => (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response(),
        "blocked" => Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})).into_response(),
        "garbage" => (StatusCode::OK, "not json at all").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_generation_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/v1beta/models/:call", post(handle_generate))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v1beta/"), state)
}

fn gateway(base_url: &str, image_model: &str, caption_model: &str) -> HttpGenerationGateway {
    HttpGenerationGateway::new(HttpGatewayConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        image_model: image_model.to_string(),
        caption_model: caption_model.to_string(),
        request_timeout: Duration::from_secs(10),
    })
    .expect("client")
}

fn user_image() -> UserImage {
    UserImage::from_bytes(Some("me.jpg".into()), "image/jpeg", b"jpeg-bytes")
}

#[tokio::test]
async fn transform_image_sends_inline_image_and_prompt() {
    let (base_url, state) = spawn_generation_server().await;
    let gateway = gateway(&base_url, "image-ok", "caption-ok");

    let artifact = gateway
        .transform_image(&user_image(), "make it anime")
        .await
        .expect("artifact");
    assert_eq!(artifact, ImageArtifact::new("image/png", "c3R5bGVk"));
    assert_eq!(artifact.decode_bytes().expect("decode"), b"styled");

    let requests = state.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.call, "image-ok:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));
    let parts = &request.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], user_image().data_base64);
    assert_eq!(parts[1]["text"], "make it anime");
    assert_eq!(
        request.body["generationConfig"]["responseModalities"],
        json!(["IMAGE", "TEXT"])
    );
}

#[tokio::test]
async fn generate_caption_joins_text_parts() {
    let (base_url, state) = spawn_generation_server().await;
    let gateway = gateway(&base_url, "image-ok", "caption-ok");

    let caption = gateway
        .generate_caption("caption a cyberpunk portrait")
        .await
        .expect("caption");
    assert_eq!(caption, "Neon dreams, chrome hearts.");

    let requests = state.requests.lock().await;
    assert_eq!(requests[0].call, "caption-ok:generateContent");
    assert!(requests[0].body.get("generationConfig").is_none());
}

#[tokio::test]
async fn rejected_request_carries_service_message() {
    let (base_url, _state) = spawn_generation_server().await;
    let gateway = gateway(&base_url, "overloaded", "bare-error");

    let image_err = gateway
        .transform_image(&user_image(), "prompt")
        .await
        .expect_err("503");
    assert_eq!(image_err.stage, GenerationStage::ImageTransform);
    assert_eq!(image_err.user_message(), "The model is overloaded.");

    let caption_err = gateway.generate_caption("prompt").await.expect_err("500");
    assert_eq!(caption_err.stage, GenerationStage::Caption);
    assert!(caption_err.user_message().contains("500"));
}

#[tokio::test]
async fn blocked_and_malformed_responses_are_generation_errors() {
    let (base_url, _state) = spawn_generation_server().await;
    let gateway = gateway(&base_url, "blocked", "garbage");

    let blocked = gateway
        .transform_image(&user_image(), "prompt")
        .await
        .expect_err("blocked");
    assert_eq!(blocked.user_message(), "request blocked: SAFETY");

    let garbage = gateway.generate_caption("prompt").await.expect_err("garbage");
    assert!(garbage.user_message().starts_with("malformed response from garbage"));
}

#[tokio::test]
async fn unreachable_service_is_a_generation_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = gateway(&format!("http://{addr}"), "image-ok", "caption-ok");
    let err = gateway.generate_caption("prompt").await.expect_err("refused");
    assert_eq!(err.stage, GenerationStage::Caption);
    assert!(err.message.is_some());
}

#[tokio::test]
async fn generate_pair_over_http_returns_both_artifacts() {
    let (base_url, state) = spawn_generation_server().await;
    let gateway = gateway(&base_url, "image-ok", "caption-ok");
    let style = Style {
        id: "cyberpunk".into(),
        label: "Cyberpunk".into(),
        image_prompt: "neon".into(),
        caption_prompt: "noir".into(),
    };

    let (artifact, caption) = generate_pair(&gateway, &user_image(), &style)
        .await
        .expect("pair");
    assert_eq!(artifact.mime_type, "image/png");
    assert_eq!(caption, "Neon dreams, chrome hearts.");
    assert_eq!(state.requests.lock().await.len(), 2);
}
