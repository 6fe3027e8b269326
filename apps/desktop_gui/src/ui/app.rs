use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use client_core::{
    project, ClientSettings, ControllerSnapshot, Notification, NotificationLevel, UiState,
    UploadController, ValidationResult, View,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::{
    domain::{FileCandidate, FALLBACK_MIME_TYPE},
    protocol::HealthResponse,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorCategory, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

const NOTIFICATION_TTL: Duration = Duration::from_secs(6);
const PICKER_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub settings: ClientSettings,
}

/// Decoded RGBA thumbnail produced by the backend worker.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

fn default_upload_dir() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::desktop_dir)
        .or_else(dirs::download_dir)
        .or_else(dirs::home_dir)
}

/// Converts a drop event entry into a candidate. Web-style drops carry bytes,
/// native drops carry a path.
pub fn candidate_from_drop(file: egui::DroppedFile) -> Result<FileCandidate, String> {
    if let Some(bytes) = file.bytes {
        let mime_type = if file.mime.trim().is_empty() {
            mime_guess::from_path(&file.name)
                .first_raw()
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_string()
        } else {
            file.mime
        };
        return Ok(FileCandidate::from_bytes(file.name, mime_type, bytes.to_vec()));
    }

    if let Some(path) = file.path {
        return FileCandidate::from_path(&path)
            .map_err(|err| format!("failed to open '{}': {err}", path.display()));
    }

    Err(format!("dropped item '{}' has no readable content", file.name))
}

pub struct ClassifierApp {
    controller: Arc<UploadController>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshot: ControllerSnapshot,
    endpoint_label: String,
    confidence_threshold: f64,
    status: String,
    status_banner: Option<StatusBanner>,
    health: Option<HealthResponse>,
    preview: Option<(String, TextureHandle)>,
    pending_preview: Option<(String, PreviewImage)>,
    notification_seen: Option<(Notification, Instant)>,
}

impl ClassifierApp {
    pub fn new(
        startup: StartupConfig,
        controller: Arc<UploadController>,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let snapshot = controller.snapshot();
        let mut app = Self {
            controller,
            cmd_tx,
            ui_rx,
            snapshot,
            endpoint_label: startup.settings.endpoint_url.clone(),
            confidence_threshold: startup.settings.confidence_threshold,
            status: "Starting backend worker...".to_string(),
            status_banner: None,
            health: None,
            preview: None,
            pending_preview: None,
            notification_seen: None,
        };
        dispatch_backend_command(&app.cmd_tx, BackendCommand::CheckHealth, &mut app.status);
        app
    }

    pub fn snapshot(&self) -> &ControllerSnapshot {
        &self.snapshot
    }

    pub fn process_ui_events(&mut self) {
        self.sync_snapshot();
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::StateChanged => {}
                UiEvent::HealthChecked(health) => {
                    self.status = if health.is_healthy() {
                        format!("Connected to {} ({})", health.service, health.model)
                    } else {
                        format!("Endpoint reports status '{}'", health.status)
                    };
                    self.health = Some(health);
                }
                UiEvent::PreviewLoaded { file_name, image } => {
                    let current = self
                        .snapshot
                        .selected_file
                        .as_ref()
                        .map(|file| file.name.as_str());
                    if current == Some(file_name.as_str()) {
                        self.pending_preview = Some((file_name, image));
                    }
                }
                UiEvent::PreviewFailed { file_name, reason } => {
                    self.status = format!("No preview for {file_name}: {reason}");
                }
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    if matches!(
                        err.context(),
                        UiErrorContext::BackendStartup | UiErrorContext::FileSelection
                    ) {
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                }
            }
        }
    }

    fn sync_snapshot(&mut self) {
        let latest = self.controller.snapshot();
        if latest.selected_file.is_none() {
            self.preview = None;
            self.pending_preview = None;
        }
        self.snapshot = latest;
    }

    fn select_candidate(&mut self, candidate: FileCandidate) {
        let file_name = candidate.name.clone();
        let source = candidate.source.clone();
        if self.controller.select_file(candidate) == ValidationResult::Accepted {
            self.preview = None;
            self.pending_preview = None;
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::LoadPreview { file_name, source },
                &mut self.status,
            );
        }
    }

    fn pick_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", &PICKER_EXTENSIONS);
        if let Some(dir) = default_upload_dir() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        match FileCandidate::from_path(&path) {
            Ok(candidate) => self.select_candidate(candidate),
            Err(err) => self.show_file_error(format!("failed to open '{}': {err}", path.display())),
        }
    }

    fn handle_dropped_files(&mut self, dropped: Vec<egui::DroppedFile>) {
        let count = dropped.len();
        let Some(first) = dropped.into_iter().next() else {
            return;
        };
        if count > 1 {
            tracing::debug!(count, "ui: multiple files dropped, using the first");
        }
        match candidate_from_drop(first) {
            Ok(candidate) => self.select_candidate(candidate),
            Err(err) => self.show_file_error(err),
        }
    }

    fn show_file_error(&mut self, message: String) {
        let err = UiError::from_message(UiErrorContext::FileSelection, message);
        self.status = format!("{} error: {}", err_label(err.category()), err.message());
        self.status_banner = Some(StatusBanner {
            severity: StatusBannerSeverity::Error,
            message: self.status.clone(),
        });
    }

    fn classify(&mut self) {
        dispatch_backend_command(&self.cmd_tx, BackendCommand::Classify, &mut self.status);
    }

    fn expire_notification(&mut self) {
        let current = self.snapshot.notification.clone();
        match (current, self.notification_seen.take()) {
            (Some(current), Some((seen, at))) if current == seen => {
                if at.elapsed() >= NOTIFICATION_TTL {
                    self.controller.dismiss_notification();
                } else {
                    self.notification_seen = Some((seen, at));
                }
            }
            (Some(current), _) => {
                self.notification_seen = Some((current, Instant::now()));
            }
            (None, _) => {}
        }
    }

    fn upload_pending_preview(&mut self, ctx: &egui::Context) {
        if let Some((file_name, image)) = self.pending_preview.take() {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba);
            let texture = ctx.load_texture(
                format!("preview-{file_name}"),
                color_image,
                egui::TextureOptions::LINEAR,
            );
            self.preview = Some((file_name, texture));
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_notification(&mut self, ui: &mut egui::Ui, notification: &Notification) {
        let fill = match notification.level {
            NotificationLevel::Success => egui::Color32::from_rgb(40, 96, 60),
            NotificationLevel::Error => egui::Color32::from_rgb(111, 53, 53),
        };
        egui::Frame::NONE
            .fill(fill)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(&notification.message).color(egui::Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            self.controller.dismiss_notification();
                        }
                    });
                });
            });
    }

    fn show_upload_panel(&mut self, ui: &mut egui::Ui, view: &View) {
        ui.heading("Upload Image");
        ui.add_space(6.0);

        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let stroke_color = if hovering {
            egui::Color32::from_rgb(31, 119, 180)
        } else {
            egui::Color32::GRAY
        };
        egui::Frame::NONE
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .corner_radius(10.0)
            .inner_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.set_min_height(140.0);
                ui.vertical_centered(|ui| {
                    ui.label("Drag and drop an image here");
                    ui.small("PNG, JPG, JPEG, GIF, BMP, TIFF up to 16MB");
                    ui.add_space(8.0);
                    if ui.button("Choose an image file…").clicked() {
                        self.pick_file();
                    }
                });
            });

        if let Some(file_line) = &view.file_line {
            ui.add_space(8.0);
            ui.label(egui::RichText::new(file_line).strong());
        }

        if let Some((_, texture)) = &self.preview {
            ui.add_space(6.0);
            ui.add(egui::Image::new(texture).max_width(ui.available_width()).max_height(320.0));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let label = if view.processing {
                "Analyzing…"
            } else {
                "Classify Image"
            };
            if ui
                .add_enabled(view.can_classify, egui::Button::new(label))
                .clicked()
            {
                self.classify();
            }
            if ui
                .add_enabled(view.can_clear, egui::Button::new("Clear"))
                .clicked()
            {
                self.controller.clear();
            }
            if view.processing {
                ui.spinner();
            }
        });
    }

    fn show_results_panel(&mut self, ui: &mut egui::Ui, view: &View) {
        ui.heading("Results");
        ui.add_space(6.0);
        ui.label(egui::RichText::new(&view.status).strong());

        if let Some(error) = &view.error {
            ui.colored_label(egui::Color32::from_rgb(220, 90, 90), error);
        }

        if self.snapshot.ui_state != UiState::ResultDisplayed {
            return;
        }

        if let Some(time) = &view.processing_time_text {
            ui.label(format!("Processing time: {time} seconds"));
        }
        if let Some(notice) = &view.threshold_notice {
            ui.colored_label(egui::Color32::from_rgb(230, 170, 60), notice);
        }

        ui.add_space(6.0);
        for row in &view.rows {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(format!("{}. {}", row.rank, row.label)).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(&row.percent_text);
                });
            });
            ui.add(egui::ProgressBar::new(row.bar_fraction).desired_height(12.0));
            ui.separator();
        }

        if let Some(summary) = &view.summary {
            ui.horizontal(|ui| {
                ui.label(format!("Total predictions: {}", summary.total_predictions));
                ui.separator();
                ui.label(format!("Shown: {}", summary.shown_predictions));
                if let Some(avg) = &summary.average_confidence_text {
                    ui.separator();
                    ui.label(format!("Avg confidence: {avg}"));
                }
            });
            if let Some(stored) = &summary.stored_filename {
                ui.weak(format!("Stored on server as {stored}"));
            }
        }
    }

    fn show_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("settings_panel")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Settings");
                ui.add(
                    egui::Slider::new(&mut self.confidence_threshold, 0.0..=100.0)
                        .text("Confidence (%)"),
                );
                ui.small("Only show predictions above this confidence level");

                ui.add_space(12.0);
                ui.heading("Endpoint");
                ui.small(&self.endpoint_label);
                match &self.health {
                    Some(health) if health.is_healthy() => {
                        ui.label(format!("Model: {}", health.model));
                    }
                    Some(health) => {
                        ui.label(format!("Status: {}", health.status));
                    }
                    None => {
                        ui.label("Status: unknown");
                    }
                }
                if ui.button("Check health").clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::CheckHealth,
                        &mut self.status,
                    );
                }
            });
    }
}

impl eframe::App for ClassifierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.upload_pending_preview(ctx);
        self.expire_notification();

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            self.handle_dropped_files(dropped);
        }

        self.show_side_panel(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(egui::RichText::new(&self.status).weak());
        });

        let view = project(&self.snapshot, self.confidence_threshold);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("AI Image Classification");
            ui.add_space(4.0);
            self.show_status_banner(ui);
            if let Some(notification) = &view.notification {
                self.show_notification(ui, notification);
            }
            ui.add_space(8.0);

            ui.columns(2, |columns| {
                self.show_upload_panel(&mut columns[0], &view);
                self.show_results_panel(&mut columns[1], &view);
            });
        });

        if view.processing {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
