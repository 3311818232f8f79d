/// HTTP API Layer
///
/// This module provides the upload endpoint and the error type every handler
/// failure is converted through.

// Upload endpoint (POST/OPTIONS /upload)
pub mod upload;

// API error type and response conversion
pub mod error;

// Re-export router builder and state
pub use upload::{create_upload_routes, AppState};
pub use error::{ApiError, ApiResult};
