//! Response schema for plant identification and the validator that enforces it.
//!
//! The schema is declared in the OpenAPI subset the Gemini API accepts
//! (uppercase type names). The backend is asked to honour it, but nothing
//! guarantees it did, so every reply goes through [`parse_identification`].

use serde_json::{json, Map, Value};

use crate::error::{BloomError, Result};
use crate::model::{Difficulty, IdentificationPayload};

pub const CARE_FIELDS: [&str; 5] = ["watering", "sunlight", "soil", "fertilizer", "toxicity"];

const REQUIRED_FIELDS: [&str; 5] = [
    "commonName",
    "scientificName",
    "description",
    "care",
    "difficulty",
];

const TEXT_FIELDS: [&str; 3] = ["commonName", "scientificName", "description"];

/// The JSON schema sent with every identification request.
pub fn response_schema() -> Value {
    let care_properties: Map<String, Value> = CARE_FIELDS
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "commonName": { "type": "STRING" },
            "scientificName": { "type": "STRING" },
            "description": { "type": "STRING" },
            "origin": { "type": "STRING" },
            "difficulty": {
                "type": "STRING",
                "enum": Difficulty::ALL.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
            },
            "care": {
                "type": "OBJECT",
                "properties": care_properties,
                "required": CARE_FIELDS,
            },
        },
        "required": REQUIRED_FIELDS,
    })
}

/// Decode and validate the backend's JSON text.
///
/// Undecodable text is a [`BloomError::MalformedResponse`]. Anything that
/// decodes but does not satisfy the schema is a [`BloomError::SchemaViolation`]
/// listing every offending field path.
pub fn parse_identification(text: &str) -> Result<IdentificationPayload> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| BloomError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    let violations = violations(&value);
    if !violations.is_empty() {
        return Err(BloomError::SchemaViolation(violations.join("; ")));
    }

    serde_json::from_value(value).map_err(|e| BloomError::SchemaViolation(e.to_string()))
}

fn violations(value: &Value) -> Vec<String> {
    let Some(root) = value.as_object() else {
        return vec![format!("expected a JSON object, got {}", type_name(value))];
    };

    let mut out = Vec::new();
    for field in TEXT_FIELDS {
        check_text(root, field, field, &mut out);
    }

    match root.get("origin") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(other) => out.push(format!(
            "field `origin` must be a string, got {}",
            type_name(other)
        )),
    }

    match root.get("difficulty") {
        None | Some(Value::Null) => out.push("missing required field `difficulty`".to_string()),
        Some(Value::String(s)) if s.parse::<Difficulty>().is_err() => out.push(format!(
            "field `difficulty` = '{s}' is not one of Easy, Moderate, Challenging"
        )),
        Some(Value::String(_)) => {}
        Some(other) => out.push(format!(
            "field `difficulty` must be a string, got {}",
            type_name(other)
        )),
    }

    match root.get("care") {
        None | Some(Value::Null) => out.push("missing required field `care`".to_string()),
        Some(Value::Object(care)) => {
            for field in CARE_FIELDS {
                check_text(care, field, &format!("care.{field}"), &mut out);
            }
        }
        Some(other) => out.push(format!(
            "field `care` must be an object, got {}",
            type_name(other)
        )),
    }

    out
}

fn check_text(obj: &Map<String, Value>, key: &str, path: &str, out: &mut Vec<String>) {
    match obj.get(key) {
        None | Some(Value::Null) => out.push(format!("missing required field `{path}`")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            out.push(format!("required field `{path}` is blank"))
        }
        Some(Value::String(_)) => {}
        Some(other) => out.push(format!(
            "field `{path}` must be a string, got {}",
            type_name(other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
