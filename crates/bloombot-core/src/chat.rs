//! Streamed conversation with the gardening assistant.
//!
//! A [`ChatSession`] owns the system instruction and the committed turn
//! history. [`ChatSession::send`] opens one reply at a time; the returned
//! [`ReplyStream`] yields text fragments in arrival order and commits the
//! exchange to history only when the backend finishes cleanly.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::unfold;
use futures_util::{Stream, StreamExt};

use crate::backend::{ChatRequest, FragmentStream, GenerativeBackend};
use crate::config::ChatConfig;
use crate::error::{BloomError, Result};
use crate::model::{Conversation, ConversationTurn};

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub thinking_budget: u32,
    /// Longest wait for the stream to open or for the next fragment.
    pub idle_timeout: Duration,
}

impl ChatSettings {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            thinking_budget: config.thinking_budget,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

#[derive(Default)]
struct SessionState {
    history: Mutex<Vec<ConversationTurn>>,
    in_flight: AtomicBool,
}

/// Clears the session's in-flight flag when dropped.
struct InFlightGuard(Arc<SessionState>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

pub struct ChatSession<B> {
    backend: Arc<B>,
    system_instruction: String,
    settings: ChatSettings,
    state: Arc<SessionState>,
}

impl<B: GenerativeBackend> ChatSession<B> {
    /// Create an idle session. No network I/O happens here.
    pub fn create(
        backend: Arc<B>,
        system_instruction: impl Into<String>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            backend,
            system_instruction: system_instruction.into(),
            settings,
            state: Arc::new(SessionState::default()),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Committed turns, oldest first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        match self.state.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether a reply stream of this session is still alive.
    pub fn is_busy(&self) -> bool {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Send a user message and open the reply stream.
    ///
    /// Rejected with [`BloomError::SessionBusy`] while an earlier
    /// [`ReplyStream`] from this session has not ended or been dropped.
    pub async fn send(&self, text: &str) -> Result<ReplyStream> {
        if text.trim().is_empty() {
            return Err(BloomError::InvalidInput("message cannot be empty".into()));
        }
        if self
            .state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("send rejected, reply still streaming");
            return Err(BloomError::SessionBusy);
        }
        let guard = InFlightGuard(self.state.clone());

        let user_turn = ConversationTurn::user(text);
        let mut turns = self.history();
        turns.push(user_turn.clone());
        let request = ChatRequest {
            system_instruction: self.system_instruction.clone(),
            turns,
            thinking_budget: self.settings.thinking_budget,
        };

        tracing::info!(
            model = self.backend.model_id(),
            turns = request.turns.len(),
            chars = text.len(),
            "sending chat message"
        );

        let idle = self.settings.idle_timeout;
        let inner = match tokio::time::timeout(idle, self.backend.stream_chat(&request)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::error!(kind = e.kind(), error = %e, "chat stream failed to open");
                return Err(e);
            }
            Err(_) => {
                tracing::error!(timeout_secs = idle.as_secs(), "chat stream did not open in time");
                return Err(BloomError::Timeout(format!(
                    "no reply within {}s",
                    idle.as_secs_f32()
                )));
            }
        };

        Ok(ReplyStream::new(inner, user_turn, idle, guard))
    }
}

struct ReplyState {
    inner: FragmentStream,
    idle: Duration,
    user_turn: ConversationTurn,
    reply: String,
    fragments: usize,
    guard: Option<InFlightGuard>,
}

impl ReplyState {
    fn commit(&mut self) {
        if let Some(guard) = self.guard.take() {
            let mut history = match guard.0.history.lock() {
                Ok(history) => history,
                Err(poisoned) => poisoned.into_inner(),
            };
            history.push(self.user_turn.clone());
            history.push(ConversationTurn::model(std::mem::take(&mut self.reply)));
            drop(history);
            tracing::info!(fragments = self.fragments, "chat reply complete");
        }
    }

    fn abort(&mut self, err: BloomError) -> BloomError {
        self.guard = None;
        tracing::warn!(
            kind = err.kind(),
            error = %err,
            fragments = self.fragments,
            "chat reply interrupted"
        );
        err
    }
}

/// Text fragments of one model reply.
///
/// Yields at most one error, after which the stream ends. Dropping it early
/// releases the session without committing anything.
pub struct ReplyStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl ReplyStream {
    fn new(
        inner: FragmentStream,
        user_turn: ConversationTurn,
        idle: Duration,
        guard: InFlightGuard,
    ) -> Self {
        let state = ReplyState {
            inner,
            idle,
            user_turn,
            reply: String::new(),
            fragments: 0,
            guard: Some(guard),
        };

        let stream = unfold(state, |mut state| async move {
            // Released guard means the reply already ended one way or another.
            state.guard.as_ref()?;
            loop {
                match tokio::time::timeout(state.idle, state.inner.next()).await {
                    Ok(Some(Ok(fragment))) if fragment.is_empty() => continue,
                    Ok(Some(Ok(fragment))) => {
                        state.reply.push_str(&fragment);
                        state.fragments += 1;
                        return Some((Ok(fragment), state));
                    }
                    Ok(Some(Err(e))) => {
                        let err = match e {
                            BloomError::StreamInterrupted(_) | BloomError::Timeout(_) => e,
                            other => BloomError::StreamInterrupted(other.to_string()),
                        };
                        let err = state.abort(err);
                        return Some((Err(err), state));
                    }
                    Ok(None) if state.reply.is_empty() => {
                        let err = state.abort(BloomError::StreamInterrupted(
                            "reply ended without any text".into(),
                        ));
                        return Some((Err(err), state));
                    }
                    Ok(None) => {
                        state.commit();
                        return None;
                    }
                    Err(_) => {
                        let err = state.abort(BloomError::Timeout(format!(
                            "no fragment within {}s",
                            state.idle.as_secs_f32()
                        )));
                        return Some((Err(err), state));
                    }
                }
            }
        });

        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for ReplyStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Drive `stream` into `conversation`: allocate the reply placeholder, append
/// each fragment in order and report the updated turn to `on_update`.
///
/// On failure the turn is closed with `fallback` and the error is returned.
pub async fn stream_into<S, F>(
    conversation: &mut Conversation,
    mut stream: S,
    fallback: &str,
    mut on_update: F,
) -> Result<()>
where
    S: Stream<Item = Result<String>> + Unpin,
    F: FnMut(&ConversationTurn),
{
    conversation.begin_reply()?;
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                if let Some(turn) = conversation.append_fragment(&fragment) {
                    on_update(turn);
                }
            }
            Err(e) => {
                conversation.interrupt_reply(fallback);
                return Err(e);
            }
        }
    }
    conversation.finish_reply();
    Ok(())
}
