pub mod control;
pub mod outbound;
pub mod params;
pub mod stream;

pub use control::ControlMessage;
pub use outbound::{ErrorKind, ServerMessage};
pub use params::{Aggressiveness, SessionParams, TranslatorMode};
pub use stream::{AsrEvent, AsrEventKind, AsrWord};
