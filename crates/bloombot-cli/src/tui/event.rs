use std::path::PathBuf;

use bloombot_core::model::PlantIdentification;

/// Actions the UI sends to the async worker task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncAction {
    /// Read a photo from disk and identify it.
    Identify { path: PathBuf },
    /// Start a fresh chat session, dropping any previous one.
    OpenChat { epoch: u64 },
    /// Send a message on the current chat session and stream the reply.
    SendChat { epoch: u64, text: String },
    /// Abort any streaming reply and drop the session.
    CloseChat,
}

/// Results the async worker sends back to the UI.
///
/// Chat results carry the epoch of the session that produced them so
/// fragments from an abandoned session can be told apart.
#[derive(Debug)]
pub enum AsyncResult {
    Identified(Box<PlantIdentification>),
    IdentifyFailed(String),
    ChatFragment { epoch: u64, text: String },
    ChatFinished { epoch: u64 },
    ChatFailed { epoch: u64, message: String },
}
