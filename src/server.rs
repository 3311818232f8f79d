/// Server setup and initialization
///
/// Wires together storage, the token verifier and HTTP routes, and puts the CORS
/// headers and request tracing around all of them.

use crate::{
    api::{create_upload_routes, AppState},
    auth::TokenVerifier,
    config::Config,
    workflow::storage::WorkflowStorage,
};
use anyhow::Result;
use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue,
    },
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes and middleware
///
/// Opens the database, bootstraps its schema, and builds the router.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📋 Initializing workflow storage");
    let storage = WorkflowStorage::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open workflow database: {}", e))?;

    storage
        .init_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize workflow schema: {}", e))?;

    tracing::info!("🔑 Initializing token verifier");
    let state = AppState {
        storage,
        verifier: Arc::new(TokenVerifier::new(&config.auth.jwt_secret)),
    };

    let app = build_router(state);
    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Assemble the router around an existing state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_upload_routes().with_state(state))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting workflow upload server...");
    tracing::debug!("Configuration: {:?}", config);

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
