//! Turn handling for the interview
//!
//! A turn is either short-circuited (off-topic or missing message: canned
//! reply, history untouched) or sent to the agent gateway (user message
//! appended, model invoked, reply appended). Gateway failures leave the user
//! message in place with no assistant entry after it.

#[cfg(test)]
mod proptests;

use crate::agent::{AgentGateway, GatewayError};
use crate::conversation::{ConversationStore, Message};
use crate::filter::is_unrelated;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Instrument;

/// Reply for off-topic or missing messages. Typos are part of the observed
/// behaviour that clients match on.
pub const CANNED_REPLY: &str = "Hi Shrikant are ypu redy to ypu interview";

/// Opening prompt used when a turn starts without a message
pub const DEFAULT_PROMPT: &str = "Let's start the interview.";

/// Reply when the model answers with no text
pub const FALLBACK_REPLY: &str = "Can you elaborate?";

/// How an inbound message will be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDecision {
    ShortCircuit,
    Invoke(String),
}

/// Classify an inbound message.
///
/// Only a missing or zero-length message counts as empty; whitespace goes to
/// the model. With `start_on_empty` the default prompt is sent instead of
/// short-circuiting.
pub fn decide(message: Option<&str>, start_on_empty: bool) -> TurnDecision {
    match message.filter(|m| !m.is_empty()) {
        None if start_on_empty => TurnDecision::Invoke(DEFAULT_PROMPT.to_string()),
        None => TurnDecision::ShortCircuit,
        Some(text) if is_unrelated(text) => TurnDecision::ShortCircuit,
        Some(text) => TurnDecision::Invoke(text.to_string()),
    }
}

/// Result of a turn that did not fail, with the history as the turn left it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    ShortCircuited {
        reply: String,
        history: Vec<Message>,
    },
    Completed {
        reply: String,
        history: Vec<Message>,
    },
}

impl TurnOutcome {
    pub fn reply(&self) -> &str {
        match self {
            TurnOutcome::ShortCircuited { reply, .. } | TurnOutcome::Completed { reply, .. } => {
                reply
            }
        }
    }

    /// Full history, system message included. For a completed turn this is
    /// taken before the turn lock is released, so it always ends with the
    /// reply.
    pub fn history(&self) -> &[Message] {
        match self {
            TurnOutcome::ShortCircuited { history, .. }
            | TurnOutcome::Completed { history, .. } => history,
        }
    }
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Orchestrates turns over a shared conversation
pub struct InterviewService {
    store: Arc<ConversationStore>,
    gateway: Arc<dyn AgentGateway>,
    /// Held for a whole invoking turn and for resets
    turn_lock: Mutex<()>,
    start_on_empty: bool,
}

impl InterviewService {
    pub fn new(store: Arc<ConversationStore>, gateway: Arc<dyn AgentGateway>) -> Self {
        Self {
            store,
            gateway,
            turn_lock: Mutex::new(()),
            start_on_empty: false,
        }
    }

    #[must_use]
    pub fn with_start_on_empty(mut self, enabled: bool) -> Self {
        self.start_on_empty = enabled;
        self
    }

    /// Run one turn for `message`
    pub async fn handle_turn(&self, message: Option<&str>) -> Result<TurnOutcome, TurnError> {
        let turn_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id);

        async move {
            let text = match decide(message, self.start_on_empty) {
                TurnDecision::ShortCircuit => {
                    tracing::info!("Short-circuiting turn");
                    return Ok(TurnOutcome::ShortCircuited {
                        reply: CANNED_REPLY.to_string(),
                        history: self.store.snapshot(),
                    });
                }
                TurnDecision::Invoke(text) => text,
            };

            let _turn = self.turn_lock.lock().await;

            self.store.append(Message::user(text));
            let history = self.store.snapshot();
            tracing::debug!(messages = history.len(), "Invoking agent");

            match self.gateway.invoke(&history).await {
                Ok(reply) => {
                    let reply = reply.unwrap_or_else(|| FALLBACK_REPLY.to_string());
                    self.store.append(Message::assistant(reply.clone()));
                    let history = self.store.snapshot();
                    tracing::info!(
                        history_len = history.len(),
                        answered = self.store.visible_len() / 2,
                        "Turn completed"
                    );
                    Ok(TurnOutcome::Completed { reply, history })
                }
                Err(e) => {
                    tracing::error!(error = %e, "Turn failed; user message left unanswered");
                    Err(TurnError::from(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Restore the boot-time history, after any in-flight turn finishes
    pub async fn reset(&self) {
        let _turn = self.turn_lock.lock().await;
        let dropped = self.store.len().saturating_sub(1);
        self.store.reset();
        tracing::info!(dropped, "Conversation reset");
    }

    /// Full history including the system message
    #[cfg(test)]
    pub fn history(&self) -> Vec<Message> {
        self.store.snapshot()
    }

    /// User and assistant messages only
    pub fn feedback(&self) -> Vec<Message> {
        self.store.snapshot_visible()
    }
}
