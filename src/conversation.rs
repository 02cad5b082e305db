//! In-memory interview transcript
//!
//! The history always starts with exactly one system message. Appends go to
//! the end; `reset` swaps the whole sequence back to that single message.
//! Readers only ever receive clones.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.role != Role::System
    }
}

/// Shared, mutable conversation history
#[derive(Debug)]
pub struct ConversationStore {
    system_prompt: String,
    /// Cap on non-system messages; `None` keeps everything
    max_history: Option<usize>,
    messages: RwLock<Vec<Message>>,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>, max_history: Option<usize>) -> Self {
        let system_prompt = system_prompt.into();
        let messages = RwLock::new(vec![Message::system(system_prompt.clone())]);
        Self {
            system_prompt,
            max_history,
            messages,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Message>> {
        self.messages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Message>> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a message to the end, trimming the oldest turns if a cap is
    /// configured.
    pub fn append(&self, message: Message) {
        let mut messages = self.write();
        messages.push(message);

        if let Some(cap) = self.max_history {
            trim_to_cap(&mut messages, cap);
        }
    }

    /// Replace everything with a fresh system message
    pub fn reset(&self) {
        *self.write() = vec![Message::system(self.system_prompt.clone())];
    }

    /// Full history, system message included
    pub fn snapshot(&self) -> Vec<Message> {
        self.read().clone()
    }

    /// History without system messages, in original order
    pub fn snapshot_visible(&self) -> Vec<Message> {
        self.read()
            .iter()
            .filter(|m| m.is_visible())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn visible_len(&self) -> usize {
        self.read().iter().filter(|m| m.is_visible()).count()
    }
}

/// Drop whole turns from the front until at most `cap` non-system messages
/// remain. A turn runs from a user message up to the next one, so the
/// transcript still opens with a user message. The newest turn is never
/// dropped, even when it alone exceeds the cap.
fn trim_to_cap(messages: &mut Vec<Message>, cap: usize) {
    let mut dropped = 0;
    while messages.len() - 1 > cap {
        let Some(next_turn) = messages
            .iter()
            .skip(2)
            .position(|m| m.role == Role::User)
            .map(|i| i + 2)
        else {
            break;
        };
        dropped += next_turn - 1;
        messages.drain(1..next_turn);
    }
    if dropped > 0 {
        tracing::debug!(dropped, cap, "Trimmed conversation history");
    }
}
