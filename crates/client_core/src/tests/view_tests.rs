use shared::protocol::{ClassificationResponse, Prediction};

use crate::{
    controller::{ControllerSnapshot, FileSummary, UiState},
    view::{format_number, project},
};

fn result_snapshot(predictions: Vec<Prediction>, processing_time_seconds: f64) -> ControllerSnapshot {
    ControllerSnapshot {
        ui_state: UiState::ResultDisplayed,
        selected_file: Some(FileSummary {
            name: "photo.jpg".to_string(),
            size_bytes: 2 * 1024 * 1024,
            mime_type: "image/jpeg".to_string(),
        }),
        last_response: Some(ClassificationResponse {
            predictions,
            processing_time_seconds,
            stored_filename: None,
        }),
        ..ControllerSnapshot::default()
    }
}

#[test]
fn rows_preserve_order_and_values() {
    let view = project(
        &result_snapshot(
            vec![Prediction::new("cat", 90.0), Prediction::new("dog", 10.0)],
            0.2,
        ),
        0.0,
    );

    let texts: Vec<String> = view.rows.iter().map(|row| row.text()).collect();
    assert_eq!(texts, vec!["cat — 90%", "dog — 10%"]);
    assert_eq!(view.rows[0].rank, 1);
    assert_eq!(view.rows[1].rank, 2);
    assert!((view.rows[0].bar_fraction - 0.9).abs() < f32::EPSILON);
    assert_eq!(view.file_line.as_deref(), Some("photo.jpg (2 MB, image/jpeg)"));
    assert_eq!(view.status, "Top 2 Predictions");
}

#[test]
fn unsorted_predictions_are_not_reordered() {
    let view = project(
        &result_snapshot(
            vec![Prediction::new("low", 5.5), Prediction::new("high", 80.25)],
            1.0,
        ),
        0.0,
    );
    assert_eq!(view.rows[0].label, "low");
    assert_eq!(view.rows[0].percent_text, "5.5%");
    assert_eq!(view.rows[1].percent_text, "80.25%");
}

#[test]
fn threshold_hides_low_predictions_and_summarizes() {
    let view = project(
        &result_snapshot(
            vec![
                Prediction::new("tabby", 60.0),
                Prediction::new("tiger cat", 30.0),
                Prediction::new("egyptian cat", 70.0),
            ],
            0.15,
        ),
        50.0,
    );

    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[1].label, "egyptian cat");
    assert_eq!(view.rows[1].rank, 2);
    let summary = view.summary.expect("summary");
    assert_eq!(summary.total_predictions, 3);
    assert_eq!(summary.shown_predictions, 2);
    assert_eq!(summary.average_confidence_text.as_deref(), Some("65.0%"));
    assert!(summary.stored_filename.is_none());
    assert!(view.threshold_notice.is_none());
}

#[test]
fn summary_reports_stored_filename_when_present() {
    let mut snapshot = result_snapshot(vec![Prediction::new("cat", 90.0)], 0.2);
    if let Some(response) = snapshot.last_response.as_mut() {
        response.stored_filename = Some("20240101_120000_photo.jpg".to_string());
    }
    let summary = project(&snapshot, 0.0).summary.expect("summary");
    assert_eq!(
        summary.stored_filename.as_deref(),
        Some("20240101_120000_photo.jpg")
    );

    if let Some(response) = snapshot.last_response.as_mut() {
        response.stored_filename = Some("  ".to_string());
    }
    let summary = project(&snapshot, 0.0).summary.expect("summary");
    assert!(summary.stored_filename.is_none());
}

#[test]
fn threshold_notice_when_nothing_passes() {
    let view = project(
        &result_snapshot(vec![Prediction::new("tabby", 12.0)], 0.1),
        50.0,
    );
    assert!(view.rows.is_empty());
    assert_eq!(
        view.threshold_notice.as_deref(),
        Some("No predictions above 50% confidence threshold")
    );
}

#[test]
fn out_of_range_probability_bar_is_clamped() {
    let view = project(
        &result_snapshot(vec![Prediction::new("odd", 130.0)], 0.1),
        0.0,
    );
    assert_eq!(view.rows[0].bar_fraction, 1.0);
    assert_eq!(view.rows[0].percent_text, "130%");
}

#[test]
fn idle_and_processing_views_have_no_rows() {
    let idle = project(&ControllerSnapshot::default(), 0.0);
    assert!(idle.rows.is_empty());
    assert!(!idle.can_classify);
    assert!(!idle.can_clear);

    let mut processing = result_snapshot(vec![Prediction::new("cat", 90.0)], 0.2);
    processing.ui_state = UiState::Processing;
    processing.in_flight = true;
    let view = project(&processing, 0.0);
    assert!(view.rows.is_empty());
    assert!(view.processing);
    assert!(!view.can_classify);
    assert!(view.can_clear);
}

#[test]
fn error_view_exposes_message() {
    let snapshot = ControllerSnapshot {
        ui_state: UiState::ErrorDisplayed,
        error_message: Some("Classification service error (HTTP 500). Please try again.".into()),
        ..ControllerSnapshot::default()
    };
    let view = project(&snapshot, 0.0);
    assert_eq!(view.status, "Classification failed");
    assert!(view.error.expect("error").contains("HTTP 500"));
}

#[test]
fn numbers_print_without_padding() {
    assert_eq!(format_number(95.0), "95");
    assert_eq!(format_number(0.15), "0.15");
    assert_eq!(format_number(12.34), "12.34");
}
