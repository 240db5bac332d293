use serde::{Deserialize, Serialize};

/// Bare acknowledgement body shared by several endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub success: bool,
}

impl SimpleResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Device-reported command rejection, delivered with HTTP 200 per the
/// bridge API convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolErrorResponse {
    pub success: bool,
    pub error_code: String,
}

impl ProtocolErrorResponse {
    pub fn new(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.into(),
        }
    }
}
