use std::{io, path::PathBuf};

use thiserror::Error;

const GENERIC_FAILURE: &str = "Classification failed. Please try again.";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to the classification endpoint timed out")]
    Timeout,
    #[error("classification endpoint unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("classification endpoint returned HTTP {status}")]
    Status {
        status: u16,
        server_message: Option<String>,
    },
    #[error("classification endpoint returned an unreadable body: {0}")]
    Decode(String),
    #[error("upload could not be encoded: {0}")]
    InvalidUpload(String),
    #[error("invalid route '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },
    #[error("failed to read '{}': {source}", .path.display())]
    LocalRead { path: PathBuf, source: io::Error },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err)
        }
    }
}

/// Single error type for a classification attempt. Non-2xx statuses and
/// `success: false` bodies both land here, so callers branch once.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("classification rejected by server: {}", .0.as_deref().unwrap_or("no message"))]
    Application(Option<String>),
}

impl ClassifyError {
    /// Text shown to the user. Transport failures get a generic message;
    /// application failures show the server text verbatim when present.
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::Transport(TransportError::Timeout) => {
                "The classification service did not respond in time. Please try again."
                    .to_string()
            }
            ClassifyError::Transport(TransportError::Status { status, .. }) => {
                format!("Classification service error (HTTP {status}). Please try again.")
            }
            ClassifyError::Transport(TransportError::LocalRead { .. }) => {
                "Could not read the selected file. Please select it again.".to_string()
            }
            ClassifyError::Transport(TransportError::InvalidUpload(_)) => {
                "The selected file could not be prepared for upload. Please select it again."
                    .to_string()
            }
            ClassifyError::Transport(TransportError::InvalidRoute { .. }) => {
                "The classification endpoint address is invalid. Check the client settings."
                    .to_string()
            }
            ClassifyError::Transport(_) => {
                "Could not reach the classification service. Please try again.".to_string()
            }
            ClassifyError::Application(Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            ClassifyError::Application(_) => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClassifyError::Transport(_))
    }
}
