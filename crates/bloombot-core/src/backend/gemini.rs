use serde::{Deserialize, Serialize};

use super::sse::sse_stream;
use super::{ChatRequest, FragmentStream, GenerativeBackend, StructuredRequest};
use crate::config::GeminiConfig;
use crate::error::{BloomError, Result};
use crate::model::ConversationTurn;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini backend over the Generative Language REST API.
///
/// `POST {base}/models/{model}:generateContent` for structured output and
/// `POST {base}/models/{model}:streamGenerateContent?alt=sse` for chat.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn url(&self, method: &str, extra_query: &str) -> String {
        format!(
            "{}/models/{}:{method}?{extra_query}key={}",
            self.base_url, self.model, self.api_key
        )
    }

    async fn post(&self, url: &str, body: &GenerateRequest) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BloomError::Timeout(format!("Gemini request timed out: {e}"))
                } else {
                    // Drop the URL, it carries the key.
                    BloomError::Transport(format!("Gemini request failed: {}", e.without_url()))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(BloomError::Transport(format!(
                "Gemini error {status}: {detail}"
            )));
        }
        Ok(resp)
    }
}

impl GenerativeBackend for GeminiBackend {
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String> {
        let body = GenerateRequest::structured(request);
        let resp = self.post(&self.url("generateContent", ""), &body).await?;

        let text = resp
            .text()
            .await
            .map_err(|e| BloomError::Transport(format!("Gemini response read error: {e}")))?;
        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            BloomError::MalformedResponse(format!("Gemini response parse error: {e}"))
        })?;

        if let Some(reason) = parsed.block_reason() {
            return Err(BloomError::MalformedResponse(format!(
                "prompt blocked by Gemini: {reason}"
            )));
        }

        match parsed.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(BloomError::MalformedResponse(
                "Gemini response contained no text".into(),
            )),
        }
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<FragmentStream> {
        let body = GenerateRequest::chat(request);
        let resp = self
            .post(&self.url("streamGenerateContent", "alt=sse&"), &body)
            .await?;

        Ok(sse_stream(resp.bytes_stream(), parse_stream_event))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Map one SSE payload to a fragment. Events without text are skipped.
fn parse_stream_event(payload: &str) -> Option<Result<String>> {
    let parsed: GenerateResponse = match serde_json::from_str(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Some(Err(BloomError::StreamInterrupted(format!(
                "undecodable stream event: {e}"
            ))))
        }
    };
    if let Some(reason) = parsed.block_reason() {
        return Some(Err(BloomError::StreamInterrupted(format!(
            "reply blocked by Gemini: {reason}"
        ))));
    }
    parsed.text().filter(|t| !t.is_empty()).map(Ok)
}

// -- Wire types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn structured(request: &StructuredRequest) -> Self {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline_data(&request.mime_type, STANDARD.encode(&request.image)),
                    Part::text(&request.prompt),
                ],
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(request.schema.clone()),
                thinking_config: ThinkingConfig {
                    thinking_budget: request.thinking_budget,
                },
            },
        }
    }

    fn chat(request: &ChatRequest) -> Self {
        Self {
            contents: request.turns.iter().map(Content::from_turn).collect(),
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(&request.system_instruction)],
            }),
            generation_config: GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                thinking_config: ThinkingConfig {
                    thinking_budget: request.thinking_budget,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn from_turn(turn: &ConversationTurn) -> Self {
        Self {
            role: Some(turn.role.to_string()),
            parts: vec![Part::text(&turn.text)],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    /// Concatenated non-thought text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut out: Option<String> = None;
        for part in content.parts.iter().filter(|p| !p.thought) {
            if let Some(text) = &part.text {
                out.get_or_insert_with(String::new).push_str(text);
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
