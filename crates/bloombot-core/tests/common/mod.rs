//! Shared fixtures for HTTP-level backend tests.

#![allow(dead_code)]

use bloombot_core::config::GeminiConfig;
use bloombot_core::GeminiBackend;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test-model";

/// A backend pointed at `server`.
pub fn backend_for(server: &MockServer) -> GeminiBackend {
    let config = GeminiConfig {
        model: TEST_MODEL.to_string(),
        base_url: Some(server.uri()),
        ..Default::default()
    };
    GeminiBackend::new(TEST_KEY, &config)
}

pub fn method_path(method: &str) -> String {
    format!("/models/{TEST_MODEL}:{method}")
}

pub fn pothos_json() -> Value {
    json!({
        "commonName": "Pothos",
        "scientificName": "Epipremnum aureum",
        "description": "A hardy trailing vine with heart-shaped leaves.",
        "origin": "Solomon Islands",
        "difficulty": "Easy",
        "care": {
            "watering": "Water when the top inch of soil is dry",
            "sunlight": "Low to bright indirect light",
            "soil": "Well-draining potting mix",
            "fertilizer": "Balanced liquid feed monthly",
            "toxicity": "Toxic to cats and dogs"
        }
    })
}

/// A `generateContent` reply whose text part is `text`, preceded by a thought part.
pub fn generate_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "Looking at leaf shape...", "thought": true },
                    { "text": text }
                ]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "totalTokenCount": 321 }
    })
}

/// An SSE body carrying one event per fragment.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let event = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": fragment }] } }]
        });
        body.push_str(&format!("data: {event}\r\n\r\n"));
    }
    body
}
