use std::{path::PathBuf, time::Duration};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::{load_settings, load_settings_from, ControllerSettings, ReasoningRetention};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::ChatApp;

const APP_TITLE: &str = "Sales Assistant";

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `chat.toml` in the working directory is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Reasoning traces to keep; 0 or 1 keeps only the latest.
    #[arg(long)]
    history: Option<usize>,
}

impl Args {
    fn settings(&self) -> anyhow::Result<ControllerSettings> {
        let mut settings = match &self.config {
            Some(path) => load_settings_from(path)?,
            None => load_settings(),
        };
        if let Some(endpoint) = &self.endpoint {
            settings.chat_endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(len) = self.history {
            settings.reasoning_retention = ReasoningRetention::from_history_len(len);
        }
        settings.validate().context("invalid chat settings")?;
        Ok(settings)
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let settings = args.settings().map_err(|err| format!("{err:#}"));
    let show_history = matches!(
        settings.as_ref().map(|s| s.reasoning_retention),
        Ok(ReasoningRetention::History { .. })
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(ChatApp::new(cmd_tx, ui_rx, show_history)))),
    )
}
