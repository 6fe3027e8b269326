//! Upload controller: owns the selected file and drives the
//! idle -> file-selected -> processing -> result/error state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{self, FileCandidate, FileSource, SelectedFile, ValidationResult},
    protocol::ClassificationResponse,
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClassifyError, TransportError},
    ClassificationUpload, ClassifierClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    FileSelected,
    Processing,
    ResultDisplayed,
    ErrorDisplayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Dismissible message surfaced next to the main view.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl From<&SelectedFile> for FileSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name().to_string(),
            size_bytes: file.size_bytes(),
            mime_type: file.mime_type().to_string(),
        }
    }
}

/// Read-only copy of the controller state handed to renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub ui_state: UiState,
    pub selected_file: Option<FileSummary>,
    pub last_response: Option<ClassificationResponse>,
    pub error_message: Option<String>,
    pub notification: Option<Notification>,
    pub in_flight: bool,
}

/// Receives a snapshot after every state transition.
pub trait RenderSink: Send + Sync {
    fn render(&self, snapshot: &ControllerSnapshot);
}

pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn render(&self, _snapshot: &ControllerSnapshot) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFileSelected,
    AlreadyProcessing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyOutcome {
    Classified,
    Failed,
    Skipped(SkipReason),
}

#[derive(Default)]
struct ControllerState {
    ui_state: UiState,
    selected: Option<SelectedFile>,
    last_response: Option<ClassificationResponse>,
    error_message: Option<String>,
    notification: Option<Notification>,
    flight: Option<u64>,
    next_flight: u64,
}

impl ControllerState {
    fn resting_state(&self) -> UiState {
        if self.selected.is_some() {
            UiState::FileSelected
        } else {
            UiState::Idle
        }
    }
}

pub struct UploadController {
    client: Arc<dyn ClassifierClient>,
    sink: Arc<dyn RenderSink>,
    state: Mutex<ControllerState>,
}

impl UploadController {
    pub fn new(client: Arc<dyn ClassifierClient>, sink: Arc<dyn RenderSink>) -> Self {
        Self {
            client,
            sink,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn validate(&self, candidate: &FileCandidate) -> ValidationResult {
        domain::validate(candidate)
    }

    /// Stages `candidate` for classification. A rejected candidate leaves the
    /// previous selection untouched and raises an error notification.
    pub fn select_file(&self, candidate: FileCandidate) -> ValidationResult {
        let name = candidate.name.clone();
        let result = {
            let mut state = self.lock();
            match SelectedFile::try_from(candidate) {
                Ok(file) => {
                    info!(
                        file_name = %file.name(),
                        size_bytes = file.size_bytes(),
                        mime_type = %file.mime_type(),
                        "upload: file selected"
                    );
                    state.selected = Some(file);
                    state.ui_state = UiState::FileSelected;
                    state.last_response = None;
                    state.error_message = None;
                    state.notification = None;
                    ValidationResult::Accepted
                }
                Err(reason) => {
                    warn!(file_name = %name, reason = reason.code(), "upload: file rejected");
                    state.notification = Some(Notification::error(reason.to_string()));
                    ValidationResult::Rejected(reason)
                }
            }
        };
        self.publish();
        result
    }

    /// Only the first of several dropped files is considered. An empty drop
    /// returns `None` and changes nothing.
    pub fn select_dropped(
        &self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> Option<ValidationResult> {
        let mut candidates = candidates.into_iter();
        let first = candidates.next()?;
        let ignored = candidates.count();
        if ignored > 0 {
            debug!(ignored, "upload: multiple files dropped, using the first");
        }
        Some(self.select_file(first))
    }

    /// Submits the selected file. At most one request is in flight per
    /// controller; a call made while one is pending is skipped.
    pub async fn classify(&self) -> ClassifyOutcome {
        let (file, guard) = {
            let mut state = self.lock();
            if state.flight.is_some() {
                debug!("upload: classify ignored, request already in flight");
                return ClassifyOutcome::Skipped(SkipReason::AlreadyProcessing);
            }
            let Some(file) = state.selected.clone() else {
                debug!("upload: classify ignored, no file selected");
                return ClassifyOutcome::Skipped(SkipReason::NoFileSelected);
            };

            let flight = state.next_flight;
            state.next_flight = state.next_flight.wrapping_add(1);
            state.flight = Some(flight);
            state.ui_state = UiState::Processing;
            state.error_message = None;
            state.notification = None;
            (file, FlightGuard { controller: self, flight })
        };
        self.publish();

        let result = match load_upload(&file).await {
            Ok(upload) => self.client.classify(upload).await,
            Err(err) => Err(err.into()),
        };
        let outcome = self.apply(guard.flight, result);
        drop(guard);
        self.publish();
        outcome
    }

    /// Drops the selection and returns to idle. An in-flight request is not
    /// cancelled; its result is applied when it arrives.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            if state.flight.is_some() {
                debug!("upload: cleared while a request is in flight");
            }
            state.selected = None;
            state.ui_state = UiState::Idle;
            state.last_response = None;
            state.error_message = None;
            state.notification = None;
        }
        self.publish();
    }

    pub fn dismiss_notification(&self) {
        let changed = self.lock().notification.take().is_some();
        if changed {
            self.publish();
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.lock();
        ControllerSnapshot {
            ui_state: state.ui_state,
            selected_file: state.selected.as_ref().map(FileSummary::from),
            last_response: state.last_response.clone(),
            error_message: state.error_message.clone(),
            notification: state.notification.clone(),
            in_flight: state.flight.is_some(),
        }
    }

    fn apply(
        &self,
        flight: u64,
        result: Result<ClassificationResponse, ClassifyError>,
    ) -> ClassifyOutcome {
        let mut state = self.lock();
        if state.selected.is_none() {
            debug!(flight, "upload: applying late result after clear");
        }
        if state.flight == Some(flight) {
            state.flight = None;
        }

        match result {
            Ok(response) => {
                info!(
                    predictions = response.predictions.len(),
                    processing_time = response.processing_time_seconds,
                    "upload: classification completed"
                );
                state.notification = Some(Notification::success(format!(
                    "Classification completed in {} seconds!",
                    response.processing_time_seconds
                )));
                state.ui_state = UiState::ResultDisplayed;
                state.last_response = Some(response);
                state.error_message = None;
                ClassifyOutcome::Classified
            }
            Err(err) => {
                warn!(transport = err.is_transport(), "upload: classification failed: {err}");
                let message = err.user_message();
                state.notification = Some(Notification::error(message.clone()));
                state.ui_state = UiState::ErrorDisplayed;
                state.last_response = None;
                state.error_message = Some(message);
                ClassifyOutcome::Failed
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.sink.render(&snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the single-flight slot on every exit path, including when the
/// `classify` future is dropped before the response arrives.
struct FlightGuard<'a> {
    controller: &'a UploadController,
    flight: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.controller.lock();
            if state.flight != Some(self.flight) {
                false
            } else {
                state.flight = None;
                if state.ui_state == UiState::Processing {
                    state.ui_state = state.resting_state();
                }
                true
            }
        };
        if abandoned {
            debug!(flight = self.flight, "upload: request abandoned before completion");
            self.controller.publish();
        }
    }
}

async fn load_upload(file: &SelectedFile) -> Result<ClassificationUpload, TransportError> {
    let bytes = match file.source() {
        FileSource::Bytes(bytes) => bytes.clone(),
        FileSource::Path(path) => {
            tokio::fs::read(path)
                .await
                .map_err(|source| TransportError::LocalRead {
                    path: path.clone(),
                    source,
                })?
        }
    };
    Ok(ClassificationUpload {
        file_name: file.name().to_string(),
        mime_type: file.mime_type().to_string(),
        bytes,
    })
}
