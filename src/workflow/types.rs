/// Upload request and payload shape definitions
///
/// `workflow` and `workflow_api` are stored exactly as received. The typed views below
/// exist only to check that each payload has the structure a workflow editor produces.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Body of `POST /upload`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    #[serde(default, deserialize_with = "present_string")]
    pub workflow_id: Option<String>,
    #[serde(default, deserialize_with = "present_string")]
    pub workflow_name: Option<String>,
    /// Editor graph, stored verbatim
    pub workflow: Value,
    /// Derived API-facing schema, stored verbatim
    pub workflow_api: Value,
}

/// Optional string field that may be omitted but not sent as `null`
fn present_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

/// Editor graph structure expected in `workflow`
#[derive(Debug, Deserialize)]
pub struct WorkflowShape {
    pub last_node_id: f64,
    pub last_link_id: f64,
    pub nodes: Vec<WorkflowNodeShape>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowNodeShape {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// One entry of `workflow_api`, keyed by node id
#[derive(Debug, Deserialize)]
pub struct WorkflowApiNodeShape {
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub class_type: Option<String>,
}

pub type WorkflowApiShape = BTreeMap<String, WorkflowApiNodeShape>;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid request body: {0}")]
    Body(#[source] serde_json::Error),

    #[error("invalid workflow: {0}")]
    Workflow(#[source] serde_json::Error),

    #[error("invalid workflow_api: {0}")]
    WorkflowApi(#[source] serde_json::Error),
}

/// Where an upload lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Create a workflow with this name and store version 1 under it
    NewWorkflow { name: String },
    /// Append the next version to an existing workflow
    ExistingWorkflow { workflow_id: String },
}

/// Payloads of a single version row
#[derive(Debug, Clone, Serialize)]
pub struct VersionPayload {
    pub workflow: Value,
    pub workflow_api: Value,
}

/// Result of a successful upload, also the `200` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub workflow_id: String,
    pub version: i64,
}

impl UploadRequest {
    /// Parse a raw JSON body and check both payload shapes
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        let request: UploadRequest = serde_json::from_slice(body).map_err(ValidationError::Body)?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        WorkflowShape::deserialize(&self.workflow).map_err(ValidationError::Workflow)?;
        WorkflowApiShape::deserialize(&self.workflow_api).map_err(ValidationError::WorkflowApi)?;
        Ok(())
    }

    /// Pick the write path. An empty `workflow_id` counts as absent.
    ///
    /// Returns `None` when there is neither an id nor a name to work with.
    pub fn target(&self) -> Option<UploadTarget> {
        let workflow_id = self.workflow_id.as_deref().filter(|id| !id.is_empty());
        let workflow_name = self.workflow_name.as_deref().filter(|name| !name.is_empty());

        match (workflow_id, workflow_name) {
            (None, Some(name)) => Some(UploadTarget::NewWorkflow { name: name.to_string() }),
            (Some(id), _) => Some(UploadTarget::ExistingWorkflow { workflow_id: id.to_string() }),
            (None, None) => None,
        }
    }

    pub fn into_payload(self) -> VersionPayload {
        VersionPayload {
            workflow: self.workflow,
            workflow_api: self.workflow_api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(extra: Value) -> Vec<u8> {
        let mut base = json!({
            "workflow": {
                "last_node_id": 2,
                "last_link_id": 1,
                "nodes": [{ "id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["sd15.safetensors"] }],
                "links": [[1, 1, 0, 2, 0, "MODEL"]],
                "version": 0.4
            },
            "workflow_api": {
                "1": { "inputs": { "ckpt_name": "sd15.safetensors" }, "class_type": "CheckpointLoaderSimple" }
            }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::to_vec(&base).unwrap()
    }

    #[test]
    fn name_without_id_creates_a_workflow() {
        let request = UploadRequest::parse(&body(json!({ "workflow_name": "demo" }))).unwrap();
        assert_eq!(request.target(), Some(UploadTarget::NewWorkflow { name: "demo".to_string() }));
    }

    #[test]
    fn empty_id_with_name_still_creates() {
        let request =
            UploadRequest::parse(&body(json!({ "workflow_id": "", "workflow_name": "demo" }))).unwrap();
        assert_eq!(request.target(), Some(UploadTarget::NewWorkflow { name: "demo".to_string() }));
    }

    #[test]
    fn id_takes_precedence_over_name() {
        let request =
            UploadRequest::parse(&body(json!({ "workflow_id": "wf-1", "workflow_name": "demo" }))).unwrap();
        assert_eq!(
            request.target(),
            Some(UploadTarget::ExistingWorkflow { workflow_id: "wf-1".to_string() })
        );
    }

    #[test]
    fn nothing_to_route_on() {
        let request = UploadRequest::parse(&body(json!({}))).unwrap();
        assert_eq!(request.target(), None);

        let request =
            UploadRequest::parse(&body(json!({ "workflow_id": "", "workflow_name": "" }))).unwrap();
        assert_eq!(request.target(), None);
    }

    #[test]
    fn payloads_are_kept_verbatim() {
        let request = UploadRequest::parse(&body(json!({ "workflow_name": "demo" }))).unwrap();
        let payload = request.into_payload();
        assert_eq!(payload.workflow["links"], json!([[1, 1, 0, 2, 0, "MODEL"]]));
        assert_eq!(payload.workflow["version"], json!(0.4));
    }

    #[test]
    fn malformed_workflow_is_rejected() {
        let raw = json!({
            "workflow_name": "demo",
            "workflow": { "nodes": "not-a-list" },
            "workflow_api": {}
        });
        let err = UploadRequest::parse(&serde_json::to_vec(&raw).unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::Workflow(_)));
    }

    #[test]
    fn malformed_workflow_api_is_rejected() {
        let raw = json!({
            "workflow": { "last_node_id": 0, "last_link_id": 0, "nodes": [] },
            "workflow_api": { "1": { "class_type": "KSampler" } }
        });
        let err = UploadRequest::parse(&serde_json::to_vec(&raw).unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::WorkflowApi(_)));
    }

    #[test]
    fn missing_payload_or_bad_json_is_a_body_error() {
        let raw = json!({ "workflow_name": "demo", "workflow_api": {} });
        let err = UploadRequest::parse(&serde_json::to_vec(&raw).unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));

        assert!(matches!(UploadRequest::parse(b"{not json"), Err(ValidationError::Body(_))));
    }

    #[test]
    fn null_routing_fields_are_a_body_error() {
        let err = UploadRequest::parse(&body(json!({ "workflow_id": null, "workflow_name": "demo" })))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));

        let err = UploadRequest::parse(&body(json!({ "workflow_name": null }))).unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));
    }

    #[test]
    fn non_string_workflow_id_is_a_body_error() {
        let err = UploadRequest::parse(&body(json!({ "workflow_id": 42 }))).unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));
    }
}
