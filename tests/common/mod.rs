#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use workflow_upload::{
    auth::TokenVerifier,
    build_router,
    config::DatabaseConfig,
    AppState, WorkflowStorage,
};

pub const SECRET: &str = "integration-test-secret";

/// A router backed by a fresh on-disk SQLite file
pub struct TestApp {
    pub router: Router,
    pub storage: WorkflowStorage,
    _dir: TempDir,
}

pub async fn setup_storage() -> (WorkflowStorage, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("workflows.db").display()),
        max_connections: 8,
        busy_timeout_secs: 10,
    };

    let storage = WorkflowStorage::connect(&config)
        .await
        .expect("Failed to open test database");
    storage.init_schema().await.expect("Failed to create schema");

    (storage, dir)
}

pub async fn setup_app() -> TestApp {
    let (storage, dir) = setup_storage().await;
    let router = build_router(AppState {
        storage: storage.clone(),
        verifier: Arc::new(TokenVerifier::new(SECRET)),
    });

    TestApp { router, storage, _dir: dir }
}

pub fn token_for(user_id: &str) -> String {
    sign(json!({ "user_id": user_id, "org_id": "org-1", "iat": chrono::Utc::now().timestamp() }))
}

pub fn sign(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub fn sample_workflow() -> Value {
    json!({
        "last_node_id": 2,
        "last_link_id": 1,
        "nodes": [
            { "id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["sd15.safetensors"] },
            { "id": 2, "type": "KSampler", "widgets_values": [42, "fixed", 20] }
        ],
        "links": [[1, 1, 0, 2, 0, "MODEL"]]
    })
}

pub fn sample_workflow_api() -> Value {
    json!({
        "1": { "inputs": { "ckpt_name": "sd15.safetensors" }, "class_type": "CheckpointLoaderSimple" },
        "2": { "inputs": { "seed": 42, "model": ["1", 0] }, "class_type": "KSampler" }
    })
}

/// Upload body with the sample payloads plus the given routing fields
pub fn upload_body(fields: Value) -> Value {
    let mut body = json!({
        "workflow": sample_workflow(),
        "workflow_api": sample_workflow_api(),
    });
    if let (Some(body), Some(fields)) = (body.as_object_mut(), fields.as_object()) {
        body.extend(fields.clone());
    }
    body
}

pub fn upload_request(token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
