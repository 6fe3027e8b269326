//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClassifierClient, ControllerSnapshot, RenderSink, UploadController};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::FileSource;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::app::PreviewImage;

const PREVIEW_MAX_EDGE: u32 = 512;

/// Wakes the UI thread when controller state changes. A full queue loses
/// nothing because the UI re-reads the snapshot every frame.
pub struct ChannelRenderSink {
    ui_tx: Sender<UiEvent>,
}

impl ChannelRenderSink {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self { ui_tx }
    }
}

impl RenderSink for ChannelRenderSink {
    fn render(&self, snapshot: &ControllerSnapshot) {
        if self.ui_tx.try_send(UiEvent::StateChanged).is_err() {
            tracing::debug!(state = ?snapshot.ui_state, "ui event queue unavailable; skipped wake-up");
        }
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    controller: Arc<UploadController>,
    client: Arc<dyn ClassifierClient>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Classify => {
                        let controller = Arc::clone(&controller);
                        tokio::spawn(async move {
                            let outcome = controller.classify().await;
                            tracing::debug!(?outcome, "backend: classify finished");
                        });
                    }
                    BackendCommand::CheckHealth => {
                        let client = Arc::clone(&client);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            tracing::info!("backend: check_health");
                            let event = match client.health().await {
                                Ok(health) => UiEvent::HealthChecked(health),
                                Err(err) => {
                                    tracing::warn!("backend: check_health failed: {err}");
                                    UiEvent::Error(UiError::from_message(
                                        UiErrorContext::HealthCheck,
                                        err.user_message(),
                                    ))
                                }
                            };
                            let _ = ui_tx.try_send(event);
                        });
                    }
                    BackendCommand::LoadPreview { file_name, source } => {
                        let ui_tx = ui_tx.clone();
                        tokio::task::spawn_blocking(move || {
                            let event = match decode_preview(&source) {
                                Ok(image) => UiEvent::PreviewLoaded { file_name, image },
                                Err(reason) => {
                                    tracing::debug!(%file_name, "backend: preview decode failed: {reason}");
                                    UiEvent::PreviewFailed { file_name, reason }
                                }
                            };
                            let _ = ui_tx.try_send(event);
                        });
                    }
                }
            }
            tracing::info!("backend: command queue closed, worker exiting");
        });
    });
}

pub fn decode_preview(source: &FileSource) -> Result<PreviewImage, String> {
    let decoded = match source {
        FileSource::Bytes(bytes) => image::load_from_memory(bytes),
        FileSource::Path(path) => image::open(path),
    }
    .map_err(|err| err.to_string())?;

    let thumbnail = decoded.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE).to_rgba8();
    let (width, height) = thumbnail.dimensions();
    Ok(PreviewImage {
        size: [width as usize, height as usize],
        rgba: thumbnail.into_raw(),
    })
}
