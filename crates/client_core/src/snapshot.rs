//! Immutable views of controller state handed to renderers.

use std::{collections::VecDeque, sync::Arc};

use shared::domain::{ReasoningRecord, TranscriptEntry, TurnSequence};

use crate::exchange::TurnFailureKind;

/// Append-only transcript. Cloning is cheap; entries are shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Arc<Vec<TranscriptEntry>>,
    evicted_bot_entries: usize,
}

impl Transcript {
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Bot entries ever appended, including any evicted by the transcript cap.
    pub fn bot_count(&self) -> usize {
        self.evicted_bot_entries + self.entries.iter().filter(|e| e.is_bot()).count()
    }

    /// 1-based ordinal of the entry at `index` among bot entries, `None` for user entries.
    pub fn bot_ordinal(&self, index: usize) -> Option<usize> {
        let entry = self.entries.get(index)?;
        if !entry.is_bot() {
            return None;
        }
        let earlier = self.entries[..index].iter().filter(|e| e.is_bot()).count();
        Some(self.evicted_bot_entries + earlier + 1)
    }

    pub fn iter_with_ordinals(&self) -> impl Iterator<Item = (&TranscriptEntry, Option<usize>)> {
        let mut seen_bots = self.evicted_bot_entries;
        self.entries.iter().map(move |entry| {
            if entry.is_bot() {
                seen_bots += 1;
                (entry, Some(seen_bots))
            } else {
                (entry, None)
            }
        })
    }

    pub(crate) fn push(&mut self, entry: TranscriptEntry, cap: Option<usize>) {
        let entries = Arc::make_mut(&mut self.entries);
        entries.push(entry);
        if let Some(cap) = cap {
            let overflow = entries.len().saturating_sub(cap);
            if overflow > 0 {
                self.evicted_bot_entries += entries[..overflow].iter().filter(|e| e.is_bot()).count();
                entries.drain(..overflow);
            }
        }
    }
}

/// A reasoning record paired with the ordinal of the bot entry it explains.
#[derive(Debug, Clone)]
pub struct ReasoningTurn {
    pub answer_ordinal: usize,
    pub sequence: TurnSequence,
    pub record: Arc<ReasoningRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ReasoningLog {
    turns: Arc<VecDeque<ReasoningTurn>>,
}

impl ReasoningLog {
    /// The newest record, regardless of retention mode.
    pub fn current(&self) -> Option<&Arc<ReasoningRecord>> {
        self.turns.back().map(|turn| &turn.record)
    }

    pub fn latest_turn(&self) -> Option<&ReasoningTurn> {
        self.turns.back()
    }

    /// Retained turns, oldest first.
    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &ReasoningTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub(crate) fn replace(&mut self, turn: ReasoningTurn, limit: usize) {
        let turns = Arc::make_mut(&mut self.turns);
        turns.push_back(turn);
        while turns.len() > limit.max(1) {
            turns.pop_front();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse(TurnSequence),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered {
        sequence: TurnSequence,
    },
    Failed {
        sequence: TurnSequence,
        kind: TurnFailureKind,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConversationSnapshot {
    pub transcript: Transcript,
    pub reasoning: ReasoningLog,
    pub draft: String,
    pub state: TurnState,
    pub last_outcome: Option<TurnOutcome>,
}

impl ConversationSnapshot {
    /// True while the authoritative turn is awaiting its reply.
    pub fn typing(&self) -> bool {
        matches!(self.state, TurnState::AwaitingResponse(_))
    }

    pub fn current_reasoning(&self) -> Option<&Arc<ReasoningRecord>> {
        self.reasoning.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_of(entries: &[TranscriptEntry], cap: Option<usize>) -> Transcript {
        let mut transcript = Transcript::default();
        for entry in entries {
            transcript.push(entry.clone(), cap);
        }
        transcript
    }

    #[test]
    fn ordinals_count_only_bot_entries() {
        let transcript = transcript_of(
            &[
                TranscriptEntry::user("hi"),
                TranscriptEntry::bot("hello"),
                TranscriptEntry::user("price?"),
                TranscriptEntry::fallback("sorry"),
            ],
            None,
        );
        assert_eq!(transcript.bot_ordinal(0), None);
        assert_eq!(transcript.bot_ordinal(1), Some(1));
        assert_eq!(transcript.bot_ordinal(3), Some(2));
        assert_eq!(transcript.bot_ordinal(9), None);
        let ordinals: Vec<_> = transcript.iter_with_ordinals().map(|(_, o)| o).collect();
        assert_eq!(ordinals, vec![None, Some(1), None, Some(2)]);
        assert_eq!(transcript.bot_count(), 2);
    }

    #[test]
    fn cap_evicts_oldest_and_keeps_ordinals_stable() {
        let transcript = transcript_of(
            &[
                TranscriptEntry::user("1"),
                TranscriptEntry::bot("a"),
                TranscriptEntry::user("2"),
                TranscriptEntry::bot("b"),
                TranscriptEntry::user("3"),
                TranscriptEntry::bot("c"),
            ],
            Some(3),
        );
        let texts: Vec<_> = transcript.entries().iter().map(|e| e.text()).collect();
        assert_eq!(texts, vec!["b", "3", "c"]);
        assert_eq!(transcript.bot_ordinal(0), Some(2));
        assert_eq!(transcript.bot_ordinal(2), Some(3));
        assert_eq!(transcript.bot_count(), 3);
    }

    #[test]
    fn pushing_does_not_disturb_earlier_snapshots() {
        let mut transcript = transcript_of(&[TranscriptEntry::user("first")], None);
        let earlier = transcript.clone();
        transcript.push(TranscriptEntry::bot("second"), None);
        assert_eq!(earlier.len(), 1);
        assert_eq!(transcript.len(), 2);
    }
}
