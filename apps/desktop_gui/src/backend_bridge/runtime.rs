//! Runtime bridge between UI command queue and the turn controller.

use std::{sync::Arc, thread};

use client_core::{ControllerSettings, HttpExchange, Submission, TurnController, TurnEvent, TurnSettings};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

pub fn launch(
    settings: Result<ControllerSettings, String>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build backend runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let built = settings.and_then(|settings| {
                let exchange = HttpExchange::new(&settings).map_err(|err| err.to_string())?;
                Ok((settings, exchange))
            });
            let (settings, exchange) = match built {
                Ok(built) => built,
                Err(err) => {
                    tracing::error!(%err, "chat client configuration rejected");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        err,
                    )));
                    return;
                }
            };
            let endpoint = exchange.endpoint().to_string();
            let controller = TurnController::new(Arc::new(exchange), TurnSettings::from(&settings));

            let mut events = controller.subscribe_events();
            let events_tx = ui_tx.clone();
            let event_task = tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(TurnEvent::Failed { kind, message, .. }) => {
                            let _ = events_tx
                                .try_send(UiEvent::Error(UiError::from_turn_failure(kind, message)));
                        }
                        Ok(TurnEvent::StaleReplyDiscarded { sequence }) => {
                            tracing::debug!(%sequence, "backend: superseded reply dropped");
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "backend: turn event stream lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::Attached(controller.subscribe()));
            let _ = ui_tx.try_send(UiEvent::Info(format!("Connected to {endpoint}")));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Submit { text } => match controller.submit(&text) {
                        Submission::Dispatched { sequence } => {
                            tracing::info!(%sequence, "backend: submit");
                        }
                        Submission::Ignored => {}
                        Submission::Rejected(reason) => {
                            let _ = ui_tx.try_send(UiEvent::SubmitRejected { text, reason });
                        }
                    },
                    BackendCommand::Shutdown => break,
                }
            }

            controller.shutdown();
            event_task.abort();
            tracing::info!("backend worker stopped");
        });
    });
}
