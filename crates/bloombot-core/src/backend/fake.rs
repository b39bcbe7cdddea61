//! Scripted in-process backend for client tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use super::{ChatRequest, FragmentStream, GenerativeBackend, StructuredRequest};
use crate::error::{BloomError, Result};

pub enum ChatScript {
    /// Yield these items, then end.
    Items(Vec<Result<String>>),
    /// Yield these fragments, then never produce another item.
    Stall(Vec<String>),
    /// Fail before any fragment is produced.
    OpenError(BloomError),
}

#[derive(Default)]
pub struct FakeBackend {
    structured: Mutex<VecDeque<Result<String>>>,
    chats: Mutex<VecDeque<ChatScript>>,
    delay: Option<Duration>,
    pub structured_requests: Mutex<Vec<StructuredRequest>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structured(self, reply: Result<String>) -> Self {
        self.structured.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_chat(self, script: ChatScript) -> Self {
        self.chats.lock().unwrap().push_back(script);
        self
    }

    /// Sleep this long before answering any request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fragments(parts: &[&str]) -> ChatScript {
        ChatScript::Items(parts.iter().map(|p| Ok(p.to_string())).collect())
    }
}

impl GenerativeBackend for FakeBackend {
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String> {
        self.structured_requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BloomError::Transport("no scripted reply".into())))
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<FragmentStream> {
        self.chat_requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let script = self.chats.lock().unwrap().pop_front();
        match script {
            Some(ChatScript::Items(items)) => Ok(stream::iter(items).boxed()),
            Some(ChatScript::Stall(parts)) => Ok(stream::iter(parts.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
            Some(ChatScript::OpenError(e)) => Err(e),
            None => Err(BloomError::Transport("no scripted chat".into())),
        }
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}
