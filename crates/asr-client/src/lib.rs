mod accumulator;
pub mod adapter;
mod error;
mod live;

pub use accumulator::SpeakerAccumulator;
pub use adapter::{AssemblyAiAdapter, RealtimeAsrAdapter, SpeechmaticsAdapter, VendorEvent};
pub use error::Error;
pub use live::{AsrAudioHandle, AsrStream, AsrStreamBuilder};
