/// Type definitions for the Control API

use crate::types::AgcSnapshot;
use sdrcast_core::AgcSettings;
use serde::{Deserialize, Serialize};

/// Response for GET /v1/streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsResponse {
    pub streams: Vec<AgcSnapshot>,
    /// Settings every new stream starts from
    pub settings: AgcSettings,
}

/// Response for POST /v1/streams/:id/reset and /v1/streams/:id/tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamUpdateResponse {
    pub success: bool,
    pub message: String,
    pub stream: Option<AgcSnapshot>,
}

/// Response for GET /v1/chat/history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub lines: Vec<String>,
    pub connections: usize,
}

/// Generic error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}
