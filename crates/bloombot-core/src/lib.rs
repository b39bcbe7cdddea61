//! Plant identification and gardening chat on top of a generative model.
//!
//! - [`identify::PlantIdentifier`] turns a photo into a validated [`model::PlantIdentification`]
//! - [`chat::ChatSession`] holds a streamed conversation with the assistant
//! - [`history::HistoryStore`] keeps the most recent identifications

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod identify;
pub mod model;
pub mod schema;

pub use backend::{GeminiBackend, GenerativeBackend};
pub use chat::{stream_into, ChatSession, ChatSettings, ReplyStream};
pub use config::BloomConfig;
pub use error::{BloomError, Result};
pub use history::{HistoryStore, HISTORY_CAPACITY};
pub use identify::{IdentifySettings, PlantIdentifier};
