use serde::{Deserialize, Serialize};

use crate::spec::SlideSpec;

/// What the transport layer hands to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub request_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            context: None,
        }
    }
}

/// What the pipeline hands back once the spec is final.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub spec: SlideSpec,
    pub request_id: String,
    pub processing_time_ms: u64,
    pub model: String,
}
