use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{GenerativeBackend, StructuredRequest};
use crate::config::BloomConfig;
use crate::error::{BloomError, Result};
use crate::model::{image_data_uri, PlantIdentification};
use crate::schema::{parse_identification, response_schema};

/// Knobs for one identification request.
#[derive(Debug, Clone)]
pub struct IdentifySettings {
    pub prompt: String,
    pub thinking_budget: u32,
    pub default_mime_type: String,
    /// Upper bound on the whole backend exchange.
    pub timeout: Duration,
}

impl IdentifySettings {
    pub fn from_config(config: &BloomConfig) -> Self {
        Self {
            prompt: config.identify.prompt.clone(),
            thinking_budget: config.identify.thinking_budget,
            default_mime_type: config.identify.default_mime_type.clone(),
            timeout: Duration::from_secs(config.gemini.request_timeout_secs),
        }
    }
}

impl Default for IdentifySettings {
    fn default() -> Self {
        Self::from_config(&BloomConfig::default_config())
    }
}

/// Turns a plant photo into a validated [`PlantIdentification`].
///
/// Each call is a single request with no retries. Every failure is terminal:
/// either a complete record comes back or an error does.
pub struct PlantIdentifier<B> {
    backend: Arc<B>,
    settings: IdentifySettings,
}

impl<B: GenerativeBackend> PlantIdentifier<B> {
    pub fn new(backend: Arc<B>, settings: IdentifySettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &IdentifySettings {
        &self.settings
    }

    /// Identify the plant in `image_bytes`.
    ///
    /// `mime_type` is forwarded as-is; an empty value falls back to the
    /// configured default.
    pub async fn identify(&self, image_bytes: &[u8], mime_type: &str) -> Result<PlantIdentification> {
        if image_bytes.is_empty() {
            return Err(BloomError::InvalidInput("image is empty".into()));
        }
        let mime_type = match mime_type.trim() {
            "" => self.settings.default_mime_type.as_str(),
            m => m,
        };

        let request = StructuredRequest {
            image: image_bytes.to_vec(),
            mime_type: mime_type.to_string(),
            prompt: self.settings.prompt.clone(),
            schema: response_schema(),
            thinking_budget: self.settings.thinking_budget,
        };

        tracing::info!(
            model = self.backend.model_id(),
            mime_type,
            bytes = image_bytes.len(),
            thinking_budget = self.settings.thinking_budget,
            "identifying plant"
        );
        let started = Instant::now();

        let text = match tokio::time::timeout(
            self.settings.timeout,
            self.backend.generate_structured(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BloomError::Timeout(format!(
                "identification exceeded {}s",
                self.settings.timeout.as_secs_f32()
            ))),
        }
        .inspect_err(log_failure)?;

        let payload = parse_identification(&text).inspect_err(log_failure)?;

        let record = PlantIdentification::from_payload(
            payload,
            Some(image_data_uri(mime_type, image_bytes)),
        );
        tracing::info!(
            id = %record.id,
            name = %record.common_name,
            difficulty = %record.difficulty,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plant identified"
        );
        Ok(record)
    }
}

fn log_failure(err: &BloomError) {
    if err.is_transport() {
        tracing::error!(kind = err.kind(), error = %err, "identification failed");
    } else {
        tracing::warn!(kind = err.kind(), error = %err, "identification rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::model::Difficulty;

    const POTHOS: &str = r#"{
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
    }"#;

    fn identifier(backend: FakeBackend) -> (PlantIdentifier<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (
            PlantIdentifier::new(backend.clone(), IdentifySettings::default()),
            backend,
        )
    }

    #[tokio::test]
    async fn test_identify_pothos_end_to_end() {
        let (id, _) = identifier(FakeBackend::new().with_structured(Ok(POTHOS.to_string())));
        let plant = id.identify(&[0xFF, 0xD8, 0xFF], "image/jpeg").await.unwrap();

        assert_eq!(plant.common_name, "Pothos");
        assert_eq!(plant.scientific_name, "Epipremnum aureum");
        assert_eq!(plant.care.watering, "Water when the top inch of soil is dry");
        assert_eq!(plant.difficulty, Difficulty::Easy);
        assert_eq!(plant.image.as_deref(), Some("data:image/jpeg;base64,/9j/"));
        assert!(!plant.id.is_nil());
    }

    #[tokio::test]
    async fn test_care_fields_non_empty() {
        let (id, _) = identifier(FakeBackend::new().with_structured(Ok(POTHOS.to_string())));
        let plant = id.identify(b"img", "image/png").await.unwrap();
        for field in [
            &plant.care.watering,
            &plant.care.sunlight,
            &plant.care.soil,
            &plant.care.fertilizer,
            &plant.care.toxicity,
        ] {
            assert!(!field.trim().is_empty());
        }
        assert!(Difficulty::ALL.contains(&plant.difficulty));
    }

    #[tokio::test]
    async fn test_request_carries_image_prompt_schema_budget() {
        let (id, backend) =
            identifier(FakeBackend::new().with_structured(Ok(POTHOS.to_string())));
        id.identify(b"png-bytes", "image/png").await.unwrap();

        let requests = backend.structured_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.image, b"png-bytes");
        assert_eq!(req.mime_type, "image/png");
        assert!(req.prompt.starts_with("Identify this plant"));
        assert_eq!(req.thinking_budget, 4000);
        assert_eq!(req.schema, response_schema());
    }

    #[tokio::test]
    async fn test_empty_mime_uses_default() {
        let (id, backend) =
            identifier(FakeBackend::new().with_structured(Ok(POTHOS.to_string())));
        let plant = id.identify(b"x", "").await.unwrap();
        assert_eq!(backend.structured_requests.lock().unwrap()[0].mime_type, "image/jpeg");
        assert!(plant.image.unwrap().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_mime_not_checked_against_bytes() {
        let (id, backend) =
            identifier(FakeBackend::new().with_structured(Ok(POTHOS.to_string())));
        id.identify(b"definitely not a webp", "image/webp").await.unwrap();
        assert_eq!(backend.structured_requests.lock().unwrap()[0].mime_type, "image/webp");
    }

    #[tokio::test]
    async fn test_empty_image_rejected_without_request() {
        let (id, backend) = identifier(FakeBackend::new());
        let err = id.identify(&[], "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BloomError::InvalidInput(_)));
        assert!(backend.structured_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_toxicity_is_schema_violation() {
        let mut value: serde_json::Value = serde_json::from_str(POTHOS).unwrap();
        value["care"].as_object_mut().unwrap().remove("toxicity");
        let (id, _) = identifier(FakeBackend::new().with_structured(Ok(value.to_string())));

        match id.identify(b"img", "image/jpeg").await {
            Err(BloomError::SchemaViolation(msg)) => assert!(msg.contains("care.toxicity")),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_is_malformed() {
        let (id, _) = identifier(
            FakeBackend::new().with_structured(Ok("Sure! This is a Pothos.".to_string())),
        );
        let err = id.identify(b"img", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BloomError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let (id, _) = identifier(
            FakeBackend::new().with_structured(Err(BloomError::Transport("HTTP 503".into()))),
        );
        let err = id.identify(b"img", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BloomError::Transport(_)));
        assert_eq!(err.user_message(), crate::error::IDENTIFY_RETRY_MESSAGE);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_structured(Ok(POTHOS.to_string()))
                .with_delay(Duration::from_millis(500)),
        );
        let settings = IdentifySettings {
            timeout: Duration::from_millis(50),
            ..IdentifySettings::default()
        };
        let id = PlantIdentifier::new(backend, settings);
        let err = id.identify(b"img", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BloomError::Timeout(_)));
    }
}
