//! Turn controller: owns the transcript and reasoning state, drives one backend exchange
//! per submitted message, and publishes every state change as a single snapshot.
//!
//! Each dispatched exchange carries a [`TurnSequence`]. Only the reply for the highest
//! dispatched sequence may change state; anything older is dropped, so the last submitted
//! message always wins regardless of network completion order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use shared::{
    domain::{TranscriptEntry, TurnSequence},
    reasoning::parse_envelope,
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::{ControllerSettings, OverlapPolicy, ReasoningRetention},
    exchange::{BackendExchange, ExchangeError, TransportError, TurnFailureKind},
    snapshot::{ConversationSnapshot, ReasoningTurn, TurnOutcome, TurnState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSettings {
    pub fallback_text: String,
    pub request_timeout: Duration,
    pub overlap_policy: OverlapPolicy,
    pub reasoning_retention: ReasoningRetention,
    pub transcript_cap: Option<usize>,
}

impl From<&ControllerSettings> for TurnSettings {
    fn from(settings: &ControllerSettings) -> Self {
        Self {
            fallback_text: settings.fallback_text.clone(),
            request_timeout: settings.request_timeout,
            overlap_policy: settings.overlap_policy,
            reasoning_retention: settings.reasoning_retention,
            transcript_cap: settings.transcript_cap,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from(&ControllerSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A turn is in flight and the overlap policy is `Reject`.
    Busy,
    /// The controller has been shut down.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing changed.
    Ignored,
    Rejected(RejectReason),
    Dispatched { sequence: TurnSequence },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Dispatched {
        sequence: TurnSequence,
    },
    Answered {
        sequence: TurnSequence,
        answer_ordinal: usize,
    },
    Failed {
        sequence: TurnSequence,
        kind: TurnFailureKind,
        message: String,
    },
    StaleReplyDiscarded {
        sequence: TurnSequence,
    },
}

struct TurnLedger {
    snapshot: ConversationSnapshot,
    last_dispatched: TurnSequence,
    in_flight: HashMap<TurnSequence, JoinHandle<()>>,
    closed: bool,
}

pub struct TurnController {
    exchange: Arc<dyn BackendExchange>,
    settings: TurnSettings,
    ledger: Mutex<TurnLedger>,
    snapshots: watch::Sender<ConversationSnapshot>,
    events: broadcast::Sender<TurnEvent>,
}

impl TurnController {
    pub fn new(exchange: Arc<dyn BackendExchange>, settings: TurnSettings) -> Arc<Self> {
        let (snapshots, _) = watch::channel(ConversationSnapshot::default());
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            exchange,
            settings,
            ledger: Mutex::new(TurnLedger {
                snapshot: ConversationSnapshot::default(),
                last_dispatched: TurnSequence(0),
                in_flight: HashMap::new(),
                closed: false,
            }),
            snapshots,
            events,
        })
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    pub fn set_draft(&self, text: &str) {
        let mut ledger = self.lock_ledger();
        if ledger.closed || ledger.snapshot.draft == text {
            return;
        }
        ledger.snapshot.draft = text.to_string();
        self.publish(&ledger);
    }

    pub fn submit_draft(self: &Arc<Self>) -> Submission {
        let draft = self.lock_ledger().snapshot.draft.clone();
        self.submit(&draft)
    }

    /// Append the user's message and start the backend exchange for it.
    ///
    /// The user entry is visible in the snapshot before this returns. Must be called from
    /// within a Tokio runtime.
    pub fn submit(self: &Arc<Self>, text: &str) -> Submission {
        let message = text.trim();
        if message.is_empty() {
            return Submission::Ignored;
        }

        let mut ledger = self.lock_ledger();
        if ledger.closed {
            return Submission::Rejected(RejectReason::Closed);
        }
        if self.settings.overlap_policy == OverlapPolicy::Reject && ledger.snapshot.typing() {
            debug!("turn rejected while awaiting response");
            return Submission::Rejected(RejectReason::Busy);
        }

        let sequence = ledger.last_dispatched.next();
        ledger.last_dispatched = sequence;
        ledger
            .snapshot
            .transcript
            .push(TranscriptEntry::user(message), self.settings.transcript_cap);
        ledger.snapshot.draft.clear();
        ledger.snapshot.state = TurnState::AwaitingResponse(sequence);
        self.publish(&ledger);

        // The task needs the ledger to resolve, so it cannot overtake these two lines.
        let handle = self.spawn_exchange(sequence, message.to_string());
        ledger.in_flight.insert(sequence, handle);
        let _ = self.events.send(TurnEvent::Dispatched { sequence });
        drop(ledger);

        debug!(%sequence, "turn dispatched");
        Submission::Dispatched { sequence }
    }

    /// Resolve once no turn is awaiting its reply.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|snapshot| !snapshot.typing()).await;
    }

    /// Tear the controller down. In-flight exchanges are aborted and later submits rejected.
    pub fn shutdown(&self) {
        let mut ledger = self.lock_ledger();
        if ledger.closed {
            return;
        }
        ledger.closed = true;
        let aborted = ledger.in_flight.len();
        for (_, handle) in ledger.in_flight.drain() {
            handle.abort();
        }
        ledger.snapshot.state = TurnState::Idle;
        self.publish(&ledger);
        info!(aborted, "turn controller shut down");
    }

    fn spawn_exchange(self: &Arc<Self>, sequence: TurnSequence, message: String) -> JoinHandle<()> {
        let controller: Weak<Self> = Arc::downgrade(self);
        let exchange = Arc::clone(&self.exchange);
        let timeout = self.settings.request_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, exchange.exchange(&message)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout)),
            };
            match controller.upgrade() {
                Some(controller) => controller.on_backend_reply(sequence, result),
                None => debug!(%sequence, "reply arrived after controller was dropped"),
            }
        })
    }

    fn on_backend_reply(&self, sequence: TurnSequence, result: Result<Vec<u8>, TransportError>) {
        let outcome = result
            .map_err(ExchangeError::from)
            .and_then(|body| parse_envelope(&body).map_err(ExchangeError::from));

        let mut ledger = self.lock_ledger();
        ledger.in_flight.remove(&sequence);
        if ledger.closed {
            debug!(%sequence, "reply ignored after shutdown");
            return;
        }
        if sequence != ledger.last_dispatched {
            debug!(%sequence, latest = %ledger.last_dispatched, "stale reply discarded");
            drop(ledger);
            let _ = self.events.send(TurnEvent::StaleReplyDiscarded { sequence });
            return;
        }

        let cap = self.settings.transcript_cap;
        let event = match outcome {
            Ok(record) => {
                ledger
                    .snapshot
                    .transcript
                    .push(TranscriptEntry::bot(&record.final_response), cap);
                let answer_ordinal = ledger.snapshot.transcript.bot_count();
                ledger.snapshot.reasoning.replace(
                    ReasoningTurn {
                        answer_ordinal,
                        sequence,
                        record: Arc::new(record),
                    },
                    self.settings.reasoning_retention.limit(),
                );
                ledger.snapshot.last_outcome = Some(TurnOutcome::Answered { sequence });
                info!(%sequence, answer_ordinal, "turn answered");
                TurnEvent::Answered {
                    sequence,
                    answer_ordinal,
                }
            }
            Err(err) => {
                let kind = err.kind();
                warn!(%sequence, ?kind, error = %err, "turn failed; appending fallback reply");
                ledger.snapshot.transcript.push(
                    TranscriptEntry::fallback(&self.settings.fallback_text),
                    cap,
                );
                ledger.snapshot.last_outcome = Some(TurnOutcome::Failed { sequence, kind });
                TurnEvent::Failed {
                    sequence,
                    kind,
                    message: err.to_string(),
                }
            }
        };
        // Same publish as the transcript/reasoning change: typing=false implies final state.
        ledger.snapshot.state = TurnState::Idle;
        self.publish(&ledger);
        drop(ledger);

        let _ = self.events.send(event);
    }

    fn publish(&self, ledger: &TurnLedger) {
        self.snapshots.send_replace(ledger.snapshot.clone());
    }

    fn lock_ledger(&self) -> MutexGuard<'_, TurnLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TurnController {
    fn drop(&mut self) {
        let ledger = self
            .ledger
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in ledger.in_flight.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
