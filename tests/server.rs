//! HTTP surface tests: the router on an ephemeral port, providers mocked.

use genbridge::providers::{HuggingFaceProvider, Provider};
use genbridge::{server, Gateway, Orchestrator};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(upstream: &MockServer) -> String {
    let provider: Arc<dyn Provider> = Arc::new(
        HuggingFaceProvider::builder()
            .api_key("hf_test")
            .base_url(upstream.uri())
            .build()
            .unwrap(),
    );
    let gateway = Arc::new(Gateway::builder().timeout(Duration::from_secs(5)).build().unwrap());
    let orchestrator = Arc::new(Orchestrator::new(gateway, provider.clone(), provider));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(orchestrator);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    format!("http://{addr}")
}

async fn mount_text(upstream: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/models/gpt2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"generated_text": "a generated tale"}])))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_health() {
    let upstream = MockServer::start().await;
    let base = spawn_app(&upstream).await;

    let resp = reqwest::get(format!("{base}/api/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_generate_text_route() {
    let upstream = MockServer::start().await;
    mount_text(&upstream).await;
    let base = spawn_app(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate-text"))
        .json(&json!({"prompt": "tell me a tale"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"text": "a generated tale", "imageBase64": null, "imageUrl": null})
    );
}

#[tokio::test]
async fn test_generate_with_failed_image_is_still_ok() {
    let upstream = MockServer::start().await;
    mount_text(&upstream).await;
    Mock::given(path("/models/runwayml/stable-diffusion-v1-5"))
        .respond_with(ResponseTemplate::new(500).set_body_string("CUDA out of memory"))
        .mount(&upstream)
        .await;
    let base = spawn_app(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&json!({"prompt": "tell me a tale", "image": {"resolution": "512x512"}}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["text"], "a generated tale");
    assert!(body["imageBase64"].is_null());
    assert!(!body.to_string().contains("CUDA"));
}

#[tokio::test]
async fn test_missing_prompt_is_bad_request() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let base = spawn_app(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Prompt required");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let upstream = MockServer::start().await;
    let base = spawn_app(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/generate-image"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}
