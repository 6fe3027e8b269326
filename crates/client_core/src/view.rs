//! Side-effect-free projection of controller state into display text.

use shared::domain::human_readable_bytes;

use crate::controller::{ControllerSnapshot, Notification, UiState};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub rank: usize,
    pub label: String,
    pub percent_text: String,
    /// Width of the confidence bar, clamped to [0, 1].
    pub bar_fraction: f32,
}

impl PredictionRow {
    pub fn text(&self) -> String {
        format!("{} — {}", self.label, self.percent_text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub total_predictions: usize,
    pub shown_predictions: usize,
    pub average_confidence_text: Option<String>,
    /// Name the endpoint stored the upload under, when it reports one.
    pub stored_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub status: String,
    pub file_line: Option<String>,
    pub rows: Vec<PredictionRow>,
    pub processing_time_text: Option<String>,
    pub summary: Option<ResultSummary>,
    pub threshold_notice: Option<String>,
    pub error: Option<String>,
    pub notification: Option<Notification>,
    pub processing: bool,
    pub can_classify: bool,
    pub can_clear: bool,
}

/// Percentages and timings are printed as received, without rounding.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

pub fn project(snapshot: &ControllerSnapshot, confidence_threshold: f64) -> View {
    let file_line = snapshot.selected_file.as_ref().map(|file| {
        format!(
            "{} ({}, {})",
            file.name,
            human_readable_bytes(file.size_bytes),
            file.mime_type
        )
    });

    let mut rows = Vec::new();
    let mut processing_time_text = None;
    let mut summary = None;
    let mut threshold_notice = None;

    if snapshot.ui_state == UiState::ResultDisplayed {
        if let Some(response) = &snapshot.last_response {
            rows = response
                .predictions
                .iter()
                .filter(|prediction| prediction.probability >= confidence_threshold)
                .enumerate()
                .map(|(index, prediction)| PredictionRow {
                    rank: index + 1,
                    label: prediction.label.clone(),
                    percent_text: format!("{}%", format_number(prediction.probability)),
                    bar_fraction: (prediction.probability / 100.0).clamp(0.0, 1.0) as f32,
                })
                .collect();

            let shown: Vec<f64> = response
                .predictions
                .iter()
                .map(|prediction| prediction.probability)
                .filter(|probability| *probability >= confidence_threshold)
                .collect();
            let average_confidence_text = (!shown.is_empty()).then(|| {
                let average = shown.iter().sum::<f64>() / shown.len() as f64;
                format!("{average:.1}%")
            });

            if shown.is_empty() && !response.predictions.is_empty() {
                threshold_notice = Some(format!(
                    "No predictions above {}% confidence threshold",
                    format_number(confidence_threshold)
                ));
            }

            processing_time_text = Some(format_number(response.processing_time_seconds));
            summary = Some(ResultSummary {
                total_predictions: response.predictions.len(),
                shown_predictions: shown.len(),
                average_confidence_text,
                stored_filename: response
                    .stored_filename
                    .clone()
                    .filter(|name| !name.trim().is_empty()),
            });
        }
    }

    let status = match snapshot.ui_state {
        UiState::Idle => "Upload an image and click 'Classify' to see results".to_string(),
        UiState::FileSelected => match &snapshot.selected_file {
            Some(file) => format!("Ready to classify {}", file.name),
            None => "Ready to classify".to_string(),
        },
        UiState::Processing => "Analyzing your image...".to_string(),
        UiState::ResultDisplayed => format!("Top {} Predictions", rows.len()),
        UiState::ErrorDisplayed => "Classification failed".to_string(),
    };

    let error = match snapshot.ui_state {
        UiState::ErrorDisplayed => snapshot.error_message.clone(),
        _ => None,
    };

    View {
        status,
        file_line,
        rows,
        processing_time_text,
        summary,
        threshold_notice,
        error,
        notification: snapshot.notification.clone(),
        processing: snapshot.in_flight,
        can_classify: snapshot.selected_file.is_some() && !snapshot.in_flight,
        can_clear: snapshot.selected_file.is_some() || snapshot.ui_state != UiState::Idle,
    }
}
