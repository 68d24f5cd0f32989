#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use decora_api::config::ServerConfig;
use decora_api::router::build_app_router;
use decora_api::sessions::SessionStore;
use decora_api::state::AppState;
use decora_core::image::{EncodedImage, UploadedImage};
use decora_core::proposal::{ProductSuggestion, StyleDetails, StyleProposal};
use decora_core::style::STYLE_CATALOG;
use decora_events::NotificationSink;
use decora_gemini::{GeminiApiError, GeminiConfig, GenerationError};
use decora_pipeline::{Orchestrator, RemoteGeneration};

pub const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
pub const ANALYSIS: &str = "Living room, modern style";
/// Upload cap used by the test configuration.
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Scripted backend: analysis and proposals always succeed, edits echo
/// the instruction back as the new image bytes.
#[derive(Default)]
pub struct FakeRemote {
    pub fail_analysis: bool,
    pub analyze_calls: AtomicUsize,
    pub edit_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RemoteGeneration for FakeRemote {
    async fn analyze_space(&self, _image: &UploadedImage) -> Result<String, GenerationError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_analysis {
            return Err(GenerationError::Api(GeminiApiError::ApiError {
                status: 503,
                body: "overloaded".to_string(),
            }));
        }
        Ok(ANALYSIS.to_string())
    }

    async fn generate_initial_proposals(
        &self,
        image: &UploadedImage,
    ) -> Result<Vec<StyleProposal>, GenerationError> {
        Ok(STYLE_CATALOG
            .iter()
            .map(|style| {
                let details = StyleDetails {
                    description: format!("{} description", style.name),
                    furniture_recs: "furniture".to_string(),
                    color_recs: "colors".to_string(),
                    products: (0..5)
                        .map(|i| ProductSuggestion {
                            name: format!("{} product {i}", style.id),
                            url: None,
                        })
                        .collect(),
                };
                StyleProposal::assemble(
                    style,
                    EncodedImage::from_bytes("image/png", style.id.as_bytes()),
                    details,
                    image.mime_type(),
                )
            })
            .collect())
    }

    async fn apply_edit(
        &self,
        _image: &EncodedImage,
        _mime_type: &str,
        instruction: &str,
    ) -> Result<EncodedImage, GenerationError> {
        self.edit_calls.lock().unwrap().push(instruction.to_string());
        Ok(EncodedImage::from_bytes("image/png", instruction.as_bytes()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub emails: Mutex<Vec<String>>,
}

impl NotificationSink for RecordingSink {
    fn notify(&self, email: &str) {
        self.emails.lock().unwrap().push(email.to_string());
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
        max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        session_ttl_secs: 3600,
        notify_webhook_url: None,
        gemini: GeminiConfig::new("test-key"),
    }
}

pub struct TestApp {
    pub router: Router,
    pub remote: Arc<FakeRemote>,
    pub sink: Arc<RecordingSink>,
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over the given fake backend.
pub fn build_test_app(remote: FakeRemote) -> TestApp {
    let config = test_config();
    let remote = Arc::new(remote);
    let sink = Arc::new(RecordingSink::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionStore::new()),
        orchestrator: Orchestrator::new(remote.clone(), sink.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        remote,
        sink,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_bytes(
    app: &Router,
    uri: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .unwrap(),
    )
    .await
}

/// POST a multipart form with one file field.
pub async fn post_multipart(
    app: &Router,
    uri: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> Response<Body> {
    let boundary = "decora-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"room.jpg\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    post_bytes(
        app,
        uri,
        &format!("multipart/form-data; boundary={boundary}"),
        body,
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Workflow helpers
// ---------------------------------------------------------------------------

/// Create a session and return its base URI.
pub async fn create_session(app: &Router) -> String {
    let json = body_json(post_empty(app, "/api/v1/sessions").await).await;
    format!("/api/v1/sessions/{}", json["data"]["id"].as_str().unwrap())
}

/// Poll the snapshot until `done` holds, for up to five seconds.
pub async fn wait_for(
    app: &Router,
    session: &str,
    done: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..500 {
        let json = body_json(get(app, session).await).await;
        if done(&json["data"]) {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session} never reached the expected state");
}

/// Upload a photo, skip the email step and wait for the proposals.
pub async fn ready_session(app: &Router) -> String {
    let session = create_session(app).await;
    post_bytes(
        app,
        &format!("{session}/image"),
        "image/jpeg",
        JPEG_HEADER.to_vec(),
    )
    .await;
    post_empty(app, &format!("{session}/email/skip")).await;
    wait_for(app, &session, |s| s["phase"] == "proposals_ready").await;
    session
}
