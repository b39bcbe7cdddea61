use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BloomError;

/// How demanding a plant is to keep alive. The backend is constrained to
/// exactly these three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Moderate, Self::Challenging];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Challenging => "Challenging",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = BloomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                BloomError::SchemaViolation(format!(
                    "difficulty '{s}' is not one of Easy, Moderate, Challenging"
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCareProfile {
    pub watering: String,
    pub sunlight: String,
    pub soil: String,
    pub fertilizer: String,
    pub toxicity: String,
}

/// The schema-validated part of an identification, exactly as the backend
/// returned it. Client-assigned fields (`id`, `image`) are added by
/// [`PlantIdentification::from_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationPayload {
    pub common_name: String,
    pub scientific_name: String,
    pub description: String,
    #[serde(default)]
    pub origin: Option<String>,
    pub difficulty: Difficulty,
    pub care: PlantCareProfile,
}

/// One identification event. Built once after a successful backend call
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantIdentification {
    pub id: Uuid,
    pub common_name: String,
    pub scientific_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub difficulty: Difficulty,
    pub care: PlantCareProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub identified_at: DateTime<Utc>,
}

impl PlantIdentification {
    /// Attach a fresh id, the submitted photo and a timestamp to a validated payload.
    pub fn from_payload(payload: IdentificationPayload, image: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            common_name: payload.common_name,
            scientific_name: payload.scientific_name,
            description: payload.description,
            origin: payload.origin,
            difficulty: payload.difficulty,
            care: payload.care,
            image,
            identified_at: Utc::now(),
        }
    }

    /// Short id prefix for list displays.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string().chars().take(8).collect()
    }

    /// Copy without the embedded photo, for compact output.
    pub fn without_image(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

/// Build a `data:` URI embedding the raw image bytes.
pub fn image_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// First word of a care field, used for compact badges ("Bright indirect light" -> "Bright").
pub fn care_badge(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("—")
}
