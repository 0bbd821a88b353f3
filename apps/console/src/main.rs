use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, load_settings_from, ControllerSettings, ConversationSnapshot, HttpExchange,
    OverlapPolicy, ReasoningRetention, Submission, TurnController, TurnSettings,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

use render::TerminalView;

const QUIT_COMMAND: &str = "/quit";

#[derive(Parser, Debug)]
#[command(about = "Talk to the sales assistant from a terminal")]
struct Args {
    /// Settings file; `chat.toml` in the working directory is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    endpoint: Option<String>,
    /// Request field carrying the message (`content` or `human_say`).
    #[arg(long)]
    content_field: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long, value_parser = parse_overlap_policy)]
    overlap_policy: Option<OverlapPolicy>,
    /// Reasoning traces to keep; 0 or 1 keeps only the latest.
    #[arg(long)]
    history: Option<usize>,
    /// Do not print the reasoning trace after each answer.
    #[arg(long)]
    quiet: bool,
}

fn parse_overlap_policy(raw: &str) -> Result<OverlapPolicy, String> {
    OverlapPolicy::parse(raw).ok_or_else(|| format!("expected 'supersede' or 'reject', got '{raw}'"))
}

impl Args {
    fn settings(&self) -> Result<ControllerSettings> {
        let mut settings = match &self.config {
            Some(path) => load_settings_from(path)?,
            None => load_settings(),
        };
        if let Some(endpoint) = &self.endpoint {
            settings.chat_endpoint = endpoint.clone();
        }
        if let Some(field) = &self.content_field {
            settings.content_field = field.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = self.overlap_policy {
            settings.overlap_policy = policy;
        }
        if let Some(len) = self.history {
            settings.reasoning_retention = ReasoningRetention::from_history_len(len);
        }
        settings.validate().context("invalid chat settings")?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = args.settings()?;

    let exchange = HttpExchange::new(&settings).context("failed to build chat client")?;
    info!(endpoint = %exchange.endpoint(), "chat session started; type {QUIT_COMMAND} to leave");
    let controller = TurnController::new(Arc::new(exchange), TurnSettings::from(&settings));
    let renderer = tokio::spawn(render_loop(controller.subscribe(), !args.quiet));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit = false;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim() == QUIT_COMMAND {
            quit = true;
            break;
        }
        if let Submission::Rejected(reason) = controller.submit(&line) {
            warn!(?reason, "message not sent");
        }
    }

    if !quit {
        controller.wait_idle().await;
    }
    controller.shutdown();
    drop(controller);
    renderer.await.context("renderer task failed")?;
    Ok(())
}

async fn render_loop(mut rx: watch::Receiver<ConversationSnapshot>, show_reasoning: bool) {
    let mut view = TerminalView::default();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        for line in view.render(&snapshot, show_reasoning) {
            println!("{line}");
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}
