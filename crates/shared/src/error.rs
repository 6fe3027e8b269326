use serde::{Deserialize, Serialize};

/// Failure body returned by the classification endpoint:
/// `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }

    /// Extracts a server message from an arbitrary body, if the body is a
    /// well-formed failure payload with a non-empty message.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let parsed = serde_json::from_slice::<ApiError>(body).ok()?;
        if parsed.success || parsed.error.trim().is_empty() {
            return None;
        }
        Some(parsed)
    }
}
