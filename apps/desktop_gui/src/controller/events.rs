//! UI/backend events and error modeling for the desktop GUI.

use client_core::{ConversationSnapshot, RejectReason, TurnFailureKind};
use tokio::sync::watch;

pub enum UiEvent {
    Info(String),
    /// The backend worker is ready; snapshots are read straight from this receiver.
    Attached(watch::Receiver<ConversationSnapshot>),
    SubmitRejected {
        text: String,
        reason: RejectReason,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Turn,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("must not be empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("did not answer")
            || message_lower.contains("connect")
            || message_lower.contains("http ")
            || message_lower.contains("unreachable")
            || message_lower.contains("runtime")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_turn_failure(kind: TurnFailureKind, message: impl Into<String>) -> Self {
        let category = match kind {
            TurnFailureKind::Transport => UiErrorCategory::Transport,
            TurnFailureKind::MalformedJson | TurnFailureKind::MissingField => {
                UiErrorCategory::Validation
            }
        };
        Self {
            category,
            context: UiErrorContext::Turn,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-line banner text.
    pub fn headline(&self) -> String {
        let prefix = match (self.context, self.category) {
            (UiErrorContext::BackendStartup, _) => "Backend unavailable",
            (_, UiErrorCategory::Transport) => "Assistant unreachable",
            (_, UiErrorCategory::Validation) => "Assistant sent an unreadable reply",
            (_, UiErrorCategory::Unknown) => "Something went wrong",
        };
        format!("{prefix}: {}", self.message)
    }
}

pub fn describe_rejection(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::Busy => "Still waiting for the previous answer",
        RejectReason::Closed => "Chat session has ended",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_failures_map_by_kind() {
        let transport = UiError::from_turn_failure(TurnFailureKind::Transport, "HTTP 500");
        assert_eq!(transport.category(), UiErrorCategory::Transport);
        assert_eq!(transport.context(), UiErrorContext::Turn);

        let parse = UiError::from_turn_failure(TurnFailureKind::MissingField, "final_response");
        assert_eq!(parse.category(), UiErrorCategory::Validation);
        assert!(parse.headline().starts_with("Assistant sent an unreadable reply"));
    }

    #[test]
    fn free_text_messages_are_classified() {
        let endpoint = UiError::from_message(
            UiErrorContext::BackendStartup,
            "invalid chat endpoint 'nope': relative URL without a base",
        );
        assert_eq!(endpoint.category(), UiErrorCategory::Validation);
        assert!(endpoint.headline().starts_with("Backend unavailable"));

        let refused = UiError::from_message(
            UiErrorContext::General,
            "failed to reach chat backend: connection refused",
        );
        assert_eq!(refused.category(), UiErrorCategory::Transport);

        let other = UiError::from_message(UiErrorContext::General, "boom");
        assert_eq!(other.category(), UiErrorCategory::Unknown);
        assert_eq!(other.message(), "boom");
    }
}
