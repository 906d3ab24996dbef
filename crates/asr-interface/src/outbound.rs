use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AsrTransient,
    AsrFatal,
    TranslationTransient,
    TranslationFatal,
}

/// Messages pushed to the caption client.
///
/// `confirmed_*` messages are incremental: each carries only the newly
/// sealed sentence (source or translation), never the accumulated text.
/// `partial_*` messages are full snapshots of the current unsealed tail and
/// replace the previous snapshot on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConfirmedTranscript { speaker: String, text: String },
    PartialTranscript { speaker: String, text: String },
    ConfirmedTranslation { speaker: String, text: String },
    PartialTranslation { speaker: String, text: String },
    Error { kind: ErrorKind, detail: String },
}

impl ServerMessage {
    pub fn error(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Error {
            kind,
            detail: detail.into(),
        }
    }
}
