use serde::{Deserialize, Serialize};

/// Text-frame control messages accepted on the client socket alongside
/// binary audio frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    KeepAlive,
    Finalize,
    CloseStream,
}
