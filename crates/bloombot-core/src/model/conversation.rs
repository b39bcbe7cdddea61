use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{BloomError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Model, text)
    }

    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// The transcript a chat view renders.
///
/// At most one model turn is in flight at a time. A reply is assembled by
/// allocating a placeholder with [`begin_reply`](Self::begin_reply) and then
/// appending fragments to that same turn in delivery order.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    streaming: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with an opening model message.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self::new();
        if !greeting.trim().is_empty() {
            conversation.turns.push(ConversationTurn::model(greeting));
        }
        conversation
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// The turn currently receiving fragments, if any.
    pub fn streaming_turn(&self) -> Option<&ConversationTurn> {
        self.streaming.and_then(|idx| self.turns.get(idx))
    }

    pub fn push_user(&mut self, text: &str) -> Result<()> {
        if self.is_streaming() {
            return Err(BloomError::SessionBusy);
        }
        if text.trim().is_empty() {
            return Err(BloomError::InvalidInput("message cannot be empty".into()));
        }
        self.turns.push(ConversationTurn::user(text));
        Ok(())
    }

    /// Allocate the empty model turn that the next fragments are written into.
    pub fn begin_reply(&mut self) -> Result<()> {
        if self.is_streaming() {
            return Err(BloomError::SessionBusy);
        }
        self.turns.push(ConversationTurn::model(String::new()));
        self.streaming = Some(self.turns.len() - 1);
        Ok(())
    }

    /// Append a fragment to the in-flight turn. Returns `None` (and changes
    /// nothing) when no reply is in flight.
    pub fn append_fragment(&mut self, fragment: &str) -> Option<&ConversationTurn> {
        let idx = self.streaming?;
        let turn = self.turns.get_mut(idx)?;
        turn.text.push_str(fragment);
        Some(turn)
    }

    pub fn finish_reply(&mut self) {
        self.streaming = None;
    }

    /// Close the in-flight turn after a failure. Partial text stays as it
    /// was and a separate notice turn is added; an empty placeholder takes
    /// the notice text instead.
    pub fn interrupt_reply(&mut self, fallback: &str) {
        let Some(idx) = self.streaming.take() else {
            return;
        };
        match self.turns.get_mut(idx) {
            Some(turn) if turn.text.is_empty() => turn.text = fallback.to_string(),
            _ => self.turns.push(ConversationTurn::model(fallback)),
        }
    }
}
