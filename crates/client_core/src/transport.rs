//! reqwest-backed client for the classification endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    error::ApiError,
    protocol::{
        ClassificationResponse, ClassifyResponseBody, HealthResponse, CLASSIFY_PATH, HEALTH_PATH,
        IMAGE_FIELD,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{ClientSettings, SettingsError},
    error::{ClassifyError, TransportError},
    ClassificationUpload, ClassifierClient,
};

pub struct HttpClassifierClient {
    http: Client,
    endpoint: Url,
}

impl HttpClassifierClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: with_trailing_slash(endpoint),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, SettingsError> {
        let endpoint = settings.endpoint()?;
        Self::new(endpoint, settings.request_timeout()).map_err(SettingsError::HttpClient)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn route(&self, path: &str) -> Result<Url, TransportError> {
        self.endpoint
            .join(path)
            .map_err(|err| TransportError::InvalidRoute {
                path: path.to_string(),
                reason: err.to_string(),
            })
    }
}

fn with_trailing_slash(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

#[async_trait]
impl ClassifierClient for HttpClassifierClient {
    async fn classify(
        &self,
        upload: ClassificationUpload,
    ) -> Result<ClassificationResponse, ClassifyError> {
        let url = self.route(CLASSIFY_PATH)?;
        let size_bytes = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|err| TransportError::InvalidUpload(err.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        info!(
            url = %url,
            file_name = %upload.file_name,
            mime_type = %upload.mime_type,
            size_bytes,
            "classify: submitting image"
        );
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = response.status();
        let body = response.bytes().await.map_err(TransportError::from)?;

        if !status.is_success() {
            let server_message = ApiError::from_body(&body).map(|err| err.error);
            warn!(
                status = status.as_u16(),
                server_message = server_message.as_deref().unwrap_or(""),
                "classify: endpoint returned error status"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                server_message,
            }
            .into());
        }

        let decoded: ClassifyResponseBody = serde_json::from_slice(&body)
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        if !decoded.success {
            let message = decoded.error.filter(|message| !message.trim().is_empty());
            warn!(
                server_message = message.as_deref().unwrap_or(""),
                "classify: endpoint reported failure"
            );
            return Err(ClassifyError::Application(message));
        }

        debug!(
            predictions = decoded.predictions.len(),
            processing_time = decoded.processing_time,
            "classify: received predictions"
        );
        Ok(ClassificationResponse {
            predictions: decoded.predictions,
            processing_time_seconds: decoded.processing_time.unwrap_or_default(),
            stored_filename: decoded.filename,
        })
    }

    async fn health(&self) -> Result<HealthResponse, ClassifyError> {
        let url = self.route(HEALTH_PATH)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                server_message: None,
            }
            .into());
        }
        let body = response.bytes().await.map_err(TransportError::from)?;
        serde_json::from_slice(&body)
            .map_err(|err| TransportError::Decode(err.to_string()).into())
    }
}
