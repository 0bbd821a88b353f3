use std::time::Duration;

use client_core::{ConversationSnapshot, TurnOutcome};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use tokio::sync::watch;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{describe_rejection, UiError, UiErrorContext, UiEvent},
        orchestration::dispatch_backend_command,
    },
    ui::panels,
};

const BANNER_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 90, 80);

pub struct ChatApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshots: Option<watch::Receiver<ConversationSnapshot>>,
    snapshot: ConversationSnapshot,
    composer: String,
    status: String,
    banner: Option<UiError>,
    show_history: bool,
}

impl ChatApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, show_history: bool) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshots: None,
            snapshot: ConversationSnapshot::default(),
            composer: String::new(),
            status: "Starting...".to_string(),
            banner: None,
            show_history,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Attached(rx) => {
                    self.snapshot = rx.borrow().clone();
                    self.snapshots = Some(rx);
                }
                UiEvent::SubmitRejected { text, reason } => {
                    self.status = describe_rejection(reason).to_string();
                    if self.composer.trim().is_empty() {
                        self.composer = text;
                    }
                }
                UiEvent::Error(err) => {
                    tracing::warn!(category = ?err.category(), context = ?err.context(), "{}", err.message());
                    self.banner = Some(err);
                }
            }
        }
    }

    fn refresh_snapshot(&mut self) {
        let Some(rx) = self.snapshots.as_mut() else {
            return;
        };
        match rx.has_changed() {
            Ok(true) => {
                self.snapshot = rx.borrow_and_update().clone();
                if matches!(self.snapshot.last_outcome, Some(TurnOutcome::Answered { .. })) {
                    self.banner = None;
                }
            }
            Ok(false) => {}
            Err(_) => {
                self.status = "Backend worker stopped".to_string();
                self.banner = Some(UiError::from_message(
                    UiErrorContext::General,
                    "backend worker stopped; restart the app to keep chatting",
                ));
                self.snapshots = None;
            }
        }
    }

    fn try_send_composer(&mut self) {
        if self.composer.trim().is_empty() || self.snapshots.is_none() {
            return;
        }
        let cmd = BackendCommand::Submit {
            text: self.composer.clone(),
        };
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.composer.clear();
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        let mut dismiss = false;
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.checkbox(&mut self.show_history, "Reasoning history");
                });
            });
            if let Some(banner) = &self.banner {
                ui.horizontal_wrapped(|ui| {
                    ui.colored_label(BANNER_COLOR, banner.headline());
                    dismiss = ui.small_button("Dismiss").clicked();
                });
            }
        });
        if dismiss {
            self.banner = None;
        }
    }

    fn show_composer(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("composer_panel").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::multiline(&mut self.composer)
                        .id_salt("composer_text")
                        .desired_rows(2)
                        .desired_width((ui.available_width() - 80.0).max(120.0))
                        .hint_text("Message the assistant (Enter to send, Shift+Enter for newline)"),
                );
                let send_shortcut = response.has_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
                let clicked_send = ui
                    .add_enabled(!self.composer.trim().is_empty(), egui::Button::new("Send"))
                    .clicked();

                if send_shortcut || clicked_send {
                    self.try_send_composer();
                    response.request_focus();
                }
            });
            ui.add_space(6.0);
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.refresh_snapshot();

        self.show_status_bar(ctx);
        egui::SidePanel::right("reasoning_panel")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                panels::show_reasoning(ui, &self.snapshot, self.show_history);
            });
        self.show_composer(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::show_transcript(ui, &self.snapshot);
        });

        if self.snapshot.typing() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
