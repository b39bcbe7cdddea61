#[cfg(test)]
pub(crate) mod fake;
pub mod gemini;
pub mod sse;

use std::pin::Pin;

use futures_util::Stream;

use crate::error::Result;
use crate::model::ConversationTurn;

pub use gemini::GeminiBackend;

/// Ordered, lazy, finite stream of reply text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One structured-output call: an inline image plus an instruction, with the
/// reply constrained to `schema`.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub prompt: String,
    pub schema: serde_json::Value,
    pub thinking_budget: u32,
}

/// One conversational call. `turns` is the committed history followed by the
/// new user turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_instruction: String,
    pub turns: Vec<ConversationTurn>,
    pub thinking_budget: u32,
}

/// A generative model able to answer structured and conversational requests.
///
/// Implementations:
/// - `GeminiBackend`: Generative Language REST API, requires an API key
pub trait GenerativeBackend: Send + Sync {
    /// Run a structured-output request and return the raw JSON text.
    fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Open a streamed chat reply.
    fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<FragmentStream>> + Send;

    /// Model identifier for logging.
    fn model_id(&self) -> &str;
}
