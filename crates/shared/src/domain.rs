use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display text for a reasoning record whose backend reported no customer information.
pub const CUSTOMER_SUMMARY_NOT_AVAILABLE: &str = "Not available";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(EntryId);

/// Monotonic number assigned to every dispatched backend exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnSequence(pub u64);

impl TurnSequence {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TurnSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// User text, or a bot reply recovered from a valid reasoning payload.
    Message,
    /// Bot apology appended when a turn failed.
    Fallback,
}

/// One line of the transcript. Entries are immutable; the fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    id: EntryId,
    text: String,
    sender: Sender,
    kind: EntryKind,
    created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(sender: Sender, kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            id: EntryId::random(),
            text: text.into(),
            sender,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, EntryKind::Message, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, EntryKind::Message, text)
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, EntryKind::Fallback, text)
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == EntryKind::Fallback
    }
}

/// Validated reasoning trace for one answered turn.
///
/// Only [`crate::reasoning::parse`] builds these outside this crate, so a view never
/// receives a partially validated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ReasoningRecord {
    pub stage_id: String,
    pub stage_label: String,
    /// `None` when the backend sent no customer information; `Some("")` is a real, empty summary.
    pub customer_summary: Option<String>,
    pub thoughts: Vec<String>,
    pub actions: Vec<String>,
    pub action_inputs: Vec<String>,
    pub observations: Vec<String>,
    pub final_thought: Option<String>,
    pub final_response: String,
}

impl ReasoningRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stage_id: String,
        stage_label: String,
        customer_summary: Option<String>,
        thoughts: Vec<String>,
        actions: Vec<String>,
        action_inputs: Vec<String>,
        observations: Vec<String>,
        final_thought: Option<String>,
        final_response: String,
    ) -> Self {
        Self {
            stage_id,
            stage_label,
            customer_summary,
            thoughts,
            actions,
            action_inputs,
            observations,
            final_thought,
            final_response,
        }
    }

    pub fn customer_summary_display(&self) -> &str {
        self.customer_summary
            .as_deref()
            .unwrap_or(CUSTOMER_SUMMARY_NOT_AVAILABLE)
    }

    /// Labelled sections in panel order. Empty lists are omitted; the stage and customer
    /// lines are always present.
    pub fn sections(&self) -> Vec<ReasoningSection<'_>> {
        let mut sections = vec![
            ReasoningSection::line(
                "Conversation Stage",
                format!("{}: {}", self.stage_id, self.stage_label),
            ),
            ReasoningSection::line("Customer Information", self.customer_summary_display()),
        ];
        for (label, items) in [
            ("Thoughts", &self.thoughts),
            ("Actions", &self.actions),
            ("Action Inputs", &self.action_inputs),
            ("Observations", &self.observations),
        ] {
            if !items.is_empty() {
                sections.push(ReasoningSection {
                    label,
                    numbered: true,
                    items: items.iter().map(|item| item.as_str().into()).collect(),
                });
            }
        }
        if let Some(final_thought) = &self.final_thought {
            sections.push(ReasoningSection::line("Final Thought", final_thought.as_str()));
        }
        sections
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningSection<'a> {
    pub label: &'static str,
    /// List sections render as numbered items; the rest are a single line.
    pub numbered: bool,
    pub items: Vec<std::borrow::Cow<'a, str>>,
}

impl<'a> ReasoningSection<'a> {
    fn line(label: &'static str, text: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        Self {
            label,
            numbered: false,
            items: vec![text.into()],
        }
    }
}
