use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::error::TransportError;

pub const SETTINGS_FILE: &str = "classifier.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub endpoint_url: String,
    pub request_timeout_secs: u64,
    /// Predictions below this percentage are hidden from the result list.
    pub confidence_threshold: f64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:5000".into(),
            request_timeout_secs: 30,
            confidence_threshold: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("confidence threshold must be within 0-100, got {0}")]
    InvalidThreshold(f64),
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] TransportError),
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint_url: Option<String>,
    request_timeout_secs: Option<u64>,
    confidence_threshold: Option<f64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn endpoint(&self) -> Result<Url, SettingsError> {
        let url = Url::parse(self.endpoint_url.trim()).map_err(|err| {
            SettingsError::InvalidEndpoint {
                url: self.endpoint_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidEndpoint {
                url: self.endpoint_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Applies command-line flags on top of the loaded settings.
    pub fn with_overrides(
        mut self,
        endpoint_url: Option<String>,
        request_timeout_secs: Option<u64>,
        confidence_threshold: Option<f64>,
    ) -> Self {
        if let Some(endpoint_url) = endpoint_url {
            self.endpoint_url = endpoint_url;
        }
        if let Some(request_timeout_secs) = request_timeout_secs {
            self.request_timeout_secs = request_timeout_secs;
        }
        if let Some(confidence_threshold) = confidence_threshold {
            self.confidence_threshold = confidence_threshold;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.endpoint()?;
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(SettingsError::InvalidThreshold(self.confidence_threshold));
        }
        Ok(())
    }
}

/// Defaults, then `classifier.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.endpoint_url {
                    settings.endpoint_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = v;
                }
                if let Some(v) = file_cfg.confidence_threshold {
                    settings.confidence_threshold = v;
                }
            }
            Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
        }
    }

    if let Some(v) = env("CLASSIFIER_ENDPOINT") {
        settings.endpoint_url = v;
    }
    if let Some(v) = env("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(v) = env("APP__CONFIDENCE_THRESHOLD") {
        match v.parse::<f64>() {
            Ok(parsed) => settings.confidence_threshold = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__CONFIDENCE_THRESHOLD"),
        }
    }

    settings
}
