mod backend_bridge;
mod controller;
mod ui;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use client_core::{
    load_settings, ClassifierClient, ClientSettings, HttpClassifierClient, UploadController,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime::ChannelRenderSink};
use crate::controller::events::UiEvent;
use crate::ui::{ClassifierApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(about = "Desktop front-end for a remote image classification endpoint")]
struct Args {
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    threshold: Option<f64>,
}

fn startup_config(args: Args, loaded: ClientSettings) -> anyhow::Result<StartupConfig> {
    let settings = loaded.with_overrides(args.endpoint, args.timeout_secs, args.threshold);
    settings.validate().context("invalid client settings")?;
    Ok(StartupConfig { settings })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let startup = startup_config(Args::parse(), load_settings())?;
    tracing::info!(
        endpoint = %startup.settings.endpoint_url,
        timeout_secs = startup.settings.request_timeout_secs,
        "starting desktop classifier"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);

    let client: Arc<dyn ClassifierClient> = Arc::new(
        HttpClassifierClient::from_settings(&startup.settings)
            .context("failed to build classifier client")?,
    );
    let controller = Arc::new(UploadController::new(
        Arc::clone(&client),
        Arc::new(ChannelRenderSink::new(ui_tx.clone())),
    ));
    backend_bridge::runtime::launch(cmd_rx, ui_tx, Arc::clone(&controller), client);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AI Image Classification")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([820.0, 560.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "AI Image Classification",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ClassifierApp::new(
                startup, controller, cmd_tx, ui_rx,
            )))
        }),
    )
    .map_err(|err| anyhow!("desktop ui terminated with error: {err}"))
}
