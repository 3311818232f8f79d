/// Workflow upload service
///
/// Accepts workflow definitions from authenticated callers and stores each one as a
/// numbered version under its workflow record.

// Core configuration and setup
pub mod config;

// Bearer token verification
pub mod auth;

// Workflow management layer - upload types and SQLite storage
pub mod workflow;

// HTTP API layer - upload endpoint and error responses
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use api::{ApiError, AppState};
pub use auth::TokenVerifier;
pub use config::Config;
pub use server::{build_router, create_app, start_server};
pub use workflow::{UploadRequest, UploadResponse, WorkflowStorage};
