//! Plain-text rendering of conversation snapshots.

use std::collections::HashSet;

use client_core::{ConversationSnapshot, ReasoningTurn};
use shared::domain::{EntryId, Sender, TranscriptEntry, TurnSequence};

pub fn format_entry(entry: &TranscriptEntry, ordinal: Option<usize>) -> String {
    match (entry.sender(), ordinal) {
        (Sender::User, _) => format!("you > {}", entry.text()),
        (Sender::Bot, Some(n)) if entry.is_fallback() => format!("bot ({n}) ! {}", entry.text()),
        (Sender::Bot, Some(n)) => format!("bot ({n}) > {}", entry.text()),
        (Sender::Bot, None) => format!("bot > {}", entry.text()),
    }
}

pub fn format_reasoning(turn: &ReasoningTurn) -> Vec<String> {
    let mut lines = vec![format!("  [reasoning for answer ({})]", turn.answer_ordinal)];
    for section in turn.record.sections() {
        if section.numbered {
            lines.push(format!("  {}:", section.label));
            lines.extend(
                section
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("    {}. {item}", i + 1)),
            );
        } else {
            let text = section.items.join(" ");
            lines.push(format!("  {}: {text}", section.label));
        }
    }
    lines
}

/// Remembers what has already been printed so each snapshot only emits what is new.
#[derive(Default)]
pub struct TerminalView {
    printed: HashSet<EntryId>,
    was_typing: bool,
    last_reasoning: Option<TurnSequence>,
}

impl TerminalView {
    pub fn render(&mut self, snapshot: &ConversationSnapshot, show_reasoning: bool) -> Vec<String> {
        let reasoning = if show_reasoning {
            snapshot.reasoning.latest_turn()
        } else {
            None
        };
        self.render_parts(
            snapshot.transcript.iter_with_ordinals(),
            snapshot.typing(),
            reasoning,
        )
    }

    fn render_parts<'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a TranscriptEntry, Option<usize>)>,
        typing: bool,
        reasoning: Option<&ReasoningTurn>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        let mut present = HashSet::new();
        for (entry, ordinal) in entries {
            present.insert(entry.id());
            if self.printed.insert(entry.id()) {
                lines.push(format_entry(entry, ordinal));
            }
        }
        self.printed.retain(|id| present.contains(id));

        if let Some(turn) = reasoning {
            if self.last_reasoning != Some(turn.sequence) {
                self.last_reasoning = Some(turn.sequence);
                lines.extend(format_reasoning(turn));
            }
        }
        if typing && !self.was_typing {
            lines.push("bot is typing...".to_string());
        }
        self.was_typing = typing;
        lines
    }
}
