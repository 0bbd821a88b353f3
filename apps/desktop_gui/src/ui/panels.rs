use client_core::{ConversationSnapshot, ReasoningTurn};
use eframe::egui;
use shared::domain::{Sender, TranscriptEntry};

const USER_ACCENT: egui::Color32 = egui::Color32::from_rgb(88, 140, 230);
const BOT_ACCENT: egui::Color32 = egui::Color32::from_rgb(90, 185, 120);
const FALLBACK_ACCENT: egui::Color32 = egui::Color32::from_rgb(220, 120, 90);

pub fn entry_heading(entry: &TranscriptEntry, ordinal: Option<usize>) -> String {
    match (entry.sender(), ordinal) {
        (Sender::User, _) => "You".to_string(),
        (Sender::Bot, Some(n)) => format!("Assistant ({n})"),
        (Sender::Bot, None) => "Assistant".to_string(),
    }
}

pub fn reasoning_heading(turn: &ReasoningTurn) -> String {
    format!(
        "Answer ({}): {}",
        turn.answer_ordinal, turn.record.stage_label
    )
}

fn entry_accent(entry: &TranscriptEntry) -> egui::Color32 {
    if entry.is_fallback() {
        FALLBACK_ACCENT
    } else if entry.is_bot() {
        BOT_ACCENT
    } else {
        USER_ACCENT
    }
}

pub fn show_transcript(ui: &mut egui::Ui, snapshot: &ConversationSnapshot) {
    egui::ScrollArea::vertical()
        .id_salt("transcript_scroll")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if snapshot.transcript.is_empty() {
                ui.weak("Say hello to start the conversation.");
            }
            for (entry, ordinal) in snapshot.transcript.iter_with_ordinals() {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(entry_heading(entry, ordinal))
                                .strong()
                                .color(entry_accent(entry)),
                        );
                        ui.weak(entry.created_at().format("%H:%M:%S").to_string());
                    });
                    ui.label(entry.text());
                });
                ui.add_space(4.0);
            }
            if snapshot.typing() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Assistant is typing...");
                });
            }
        });
}

pub fn show_reasoning(ui: &mut egui::Ui, snapshot: &ConversationSnapshot, show_history: bool) {
    ui.heading("Thinking process");
    ui.separator();
    let Some(latest) = snapshot.reasoning.latest_turn() else {
        ui.weak("No answer yet.");
        return;
    };

    egui::ScrollArea::vertical()
        .id_salt("reasoning_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if !show_history {
                ui.label(egui::RichText::new(reasoning_heading(latest)).strong());
                show_record(ui, latest);
                return;
            }
            for turn in snapshot.reasoning.turns().rev() {
                egui::CollapsingHeader::new(reasoning_heading(turn))
                    .id_salt(("reasoning_turn", turn.sequence.0))
                    .default_open(turn.sequence == latest.sequence)
                    .show(ui, |ui| show_record(ui, turn));
            }
        });
}

fn show_record(ui: &mut egui::Ui, turn: &ReasoningTurn) {
    for section in turn.record.sections() {
        ui.label(egui::RichText::new(section.label).strong());
        if section.numbered {
            for (i, item) in section.items.iter().enumerate() {
                ui.label(format!("{}. {item}", i + 1));
            }
        } else {
            ui.label(section.items.join(" "));
        }
        ui.add_space(6.0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared::{domain::TurnSequence, reasoning::parse};

    use super::*;

    #[test]
    fn headings_number_assistant_entries() {
        assert_eq!(entry_heading(&TranscriptEntry::user("Hello"), None), "You");
        assert_eq!(
            entry_heading(&TranscriptEntry::bot("Hi"), Some(4)),
            "Assistant (4)"
        );
        assert_eq!(entry_accent(&TranscriptEntry::fallback("Sorry")), FALLBACK_ACCENT);
    }

    #[test]
    fn reasoning_heading_names_answer_and_stage() {
        let record = parse(
            &serde_json::json!({
                "final_response": "Hi there",
                "current_stage_id": "1",
                "current_conversation_stage": "Greeting"
            })
            .to_string(),
        )
        .expect("record");
        let turn = ReasoningTurn {
            answer_ordinal: 2,
            sequence: TurnSequence(3),
            record: Arc::new(record),
        };
        assert_eq!(reasoning_heading(&turn), "Answer (2): Greeting");
    }
}
