use serde::{Deserialize, Serialize};

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";
pub const CLASSIFY_PATH: &str = "classify";
pub const HEALTH_PATH: &str = "health";

/// One ranked label. `probability` is a percentage in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    pub probability: f64,
    /// Raw model score in [0, 1]; some endpoints send it alongside the percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
            confidence: None,
        }
    }
}

/// Body of a `POST /classify` response, decoded leniently so both the success
/// and the failure shape fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponseBody {
    pub success: bool,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A successful classification, in the order the endpoint returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResponse {
    pub predictions: Vec<Prediction>,
    pub processing_time_seconds: f64,
    pub stored_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub service: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
