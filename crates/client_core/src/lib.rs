//! Client core for a remote image classification endpoint: the HTTP wrapper,
//! the upload controller state machine and its rendering projection.

use async_trait::async_trait;
use shared::protocol::{ClassificationResponse, HealthResponse};

pub mod config;
pub mod controller;
pub mod error;
pub mod transport;
pub mod view;

pub use config::{load_settings, ClientSettings, SettingsError};
pub use controller::{
    ClassifyOutcome, ControllerSnapshot, FileSummary, NoopRenderSink, Notification,
    NotificationLevel, RenderSink, SkipReason, UiState, UploadController,
};
pub use error::{ClassifyError, TransportError};
pub use shared::domain::{validate, FileCandidate, RejectReason, ValidationResult};
pub use transport::HttpClassifierClient;
pub use view::{project, PredictionRow, ResultSummary, View};

/// The file content and metadata sent as the `image` multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ClassifierClient: Send + Sync {
    async fn classify(
        &self,
        upload: ClassificationUpload,
    ) -> Result<ClassificationResponse, ClassifyError>;
    async fn health(&self) -> Result<HealthResponse, ClassifyError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod view_tests;
