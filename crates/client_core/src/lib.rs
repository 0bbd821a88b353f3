//! Client-side turn synchronization for a chat transcript and its reasoning trace.

pub mod config;
pub mod controller;
pub mod exchange;
pub mod snapshot;

pub use config::{load_settings, load_settings_from, ControllerSettings, OverlapPolicy, ReasoningRetention};
pub use controller::{RejectReason, Submission, TurnController, TurnEvent, TurnSettings};
pub use exchange::{BackendExchange, ExchangeError, HttpExchange, TransportError, TurnFailureKind};
pub use snapshot::{ConversationSnapshot, ReasoningLog, ReasoningTurn, Transcript, TurnOutcome, TurnState};
