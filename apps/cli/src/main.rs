use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, project, ClassifierClient, ClassifyOutcome, ControllerSnapshot,
    HttpClassifierClient, RenderSink, UiState, UploadController, ValidationResult,
};
use shared::domain::FileCandidate;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Classify an image with a remote classification endpoint")]
struct Args {
    /// Image to upload (PNG, JPEG, GIF, BMP or TIFF, at most 16 MiB).
    image: PathBuf,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Hide predictions below this confidence percentage.
    #[arg(long)]
    threshold: Option<f64>,
    /// Probe GET /health before uploading.
    #[arg(long)]
    check_health: bool,
}

#[derive(Default)]
struct ConsoleSink {
    last_state: Mutex<Option<UiState>>,
}

impl RenderSink for ConsoleSink {
    fn render(&self, snapshot: &ControllerSnapshot) {
        let mut last = self
            .last_state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *last == Some(snapshot.ui_state) {
            return;
        }
        *last = Some(snapshot.ui_state);
        tracing::debug!(state = ?snapshot.ui_state, in_flight = snapshot.in_flight, "ui state changed");
        if snapshot.ui_state == UiState::Processing {
            eprintln!("Analyzing your image...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings().with_overrides(args.endpoint, args.timeout_secs, args.threshold);
    settings.validate().context("invalid client settings")?;

    let client = Arc::new(
        HttpClassifierClient::from_settings(&settings).context("failed to build classifier client")?,
    );

    if args.check_health {
        let health = client
            .health()
            .await
            .context("health check failed")?;
        println!(
            "Endpoint {}: status={} model={} service={}",
            client.endpoint(),
            health.status,
            health.model,
            health.service
        );
        if !health.is_healthy() {
            bail!("classification endpoint is not healthy (status '{}')", health.status);
        }
    }

    let controller = UploadController::new(client, Arc::new(ConsoleSink::default()));
    let candidate = FileCandidate::from_path(&args.image)
        .with_context(|| format!("failed to open '{}'", args.image.display()))?;
    if let ValidationResult::Rejected(reason) = controller.select_file(candidate) {
        bail!("{}: {reason}", args.image.display());
    }

    let outcome = controller.classify().await;
    let view = project(&controller.snapshot(), settings.confidence_threshold);
    match outcome {
        ClassifyOutcome::Classified => {
            if let Some(file_line) = &view.file_line {
                println!("{file_line}");
            }
            println!("{}", view.status);
            for row in &view.rows {
                println!("{:>2}. {}", row.rank, row.text());
            }
            if let Some(notice) = &view.threshold_notice {
                println!("{notice}");
            }
            if let Some(time) = &view.processing_time_text {
                println!("Processing time: {time} seconds");
            }
            if let Some(summary) = &view.summary {
                println!(
                    "Total predictions: {}  Shown: {}  Avg confidence: {}",
                    summary.total_predictions,
                    summary.shown_predictions,
                    summary.average_confidence_text.as_deref().unwrap_or("-")
                );
                if let Some(stored) = &summary.stored_filename {
                    println!("Stored on server as: {stored}");
                }
            }
            Ok(())
        }
        ClassifyOutcome::Failed => bail!(
            "{}",
            view.error
                .unwrap_or_else(|| "Classification failed. Please try again.".to_string())
        ),
        ClassifyOutcome::Skipped(reason) => bail!("classification skipped: {reason:?}"),
    }
}
