/// Workflow upload endpoint
///
/// Stores a workflow graph and its API schema as a new version. A request without a
/// `workflow_id` but with a `workflow_name` creates the workflow first.

use crate::{
    api::error::{ApiError, ApiResult},
    auth::TokenVerifier,
    workflow::{
        storage::WorkflowStorage,
        types::{UploadRequest, UploadResponse, UploadTarget},
    },
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow storage for persistence
    pub storage: WorkflowStorage,
    /// Verifier built from the configured shared secret
    pub verifier: Arc<TokenVerifier>,
}

/// Create upload routes
pub fn create_upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_workflow).options(preflight))
}

/// CORS preflight
///
/// OPTIONS /upload
/// The CORS headers themselves are set on every response by the server layer.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Store a new workflow version
///
/// POST /upload
/// Body: { "workflow_id"?: "...", "workflow_name"?: "...", "workflow": {...}, "workflow_api": {...} }
/// Returns: { "workflow_id": "...", "version": 1 }
async fn upload_workflow(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let user = state.verifier.authenticate(&headers).map_err(|e| {
        tracing::warn!("🔒 Rejected upload: {}", e);
        ApiError::from(e)
    })?;

    tracing::debug!(
        "🔑 Upload from user {} (org {:?}, token issued at {})",
        user.user_id,
        user.org_id,
        user.issued_at
    );

    let request = UploadRequest::parse(&body).map_err(|e| {
        tracing::warn!("📋 Invalid upload body from {}: {}", user.user_id, e);
        ApiError::from(e)
    })?;

    let Some(target) = request.target() else {
        tracing::warn!("📋 Upload from {} has neither workflow_id nor name", user.user_id);
        return Err(ApiError::InvalidRequest(
            "Invalid request, missing either workflow_id or name".to_string(),
        ));
    };

    let payload = request.into_payload();
    let result = match &target {
        UploadTarget::NewWorkflow { name } => {
            state.storage.create_workflow(&user.user_id, name, &payload).await
        }
        UploadTarget::ExistingWorkflow { workflow_id } => {
            state.storage.append_version(workflow_id, &payload).await
        }
    };

    let uploaded = result.map_err(|e| {
        tracing::error!("❌ Failed to store workflow version ({:?}): {}", target, e);
        ApiError::from(e)
    })?;

    tracing::info!(
        "📦 Stored workflow {} version {} for user {}",
        uploaded.workflow_id,
        uploaded.version,
        user.user_id
    );

    Ok(Json(uploaded))
}
