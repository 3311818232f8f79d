/// Workflow Management Layer
///
/// This module handles uploaded workflow definitions and their versions:
/// - Request and payload shape definitions
/// - SQLite persistence with sqlx

// Upload request, payload shapes and write-path selection
pub mod types;

// SQLite persistence layer for workflows and versions
pub mod storage;

// Re-export commonly used types
pub use storage::{WorkflowRecord, WorkflowStorage, WorkflowVersionRecord};
pub use types::{UploadRequest, UploadResponse, UploadTarget, VersionPayload};
