pub mod session;
pub mod speaker;
pub mod worker;

pub use session::{SILENCE_CONFIRM, Session};
pub use speaker::{
    Action, PipelineConfig, SPLITTER_MIN_TAIL_WORDS, SpeakerState, TONE_TRIGGER_WORDS,
};
pub use worker::{BoxFuture, LiveWorkers, TranslationWorker};
