mod assemblyai;
mod speechmatics;

pub use assemblyai::AssemblyAiAdapter;
pub use speechmatics::SpeechmaticsAdapter;

use asr_interface::SessionParams;
use bytes::Bytes;
use tokio_tungstenite::tungstenite::Message;

/// What a single vendor frame means, after parsing but before per-speaker
/// accumulation. `Final` words are committed and append to the speaker's
/// transcript; `Partial` words replace the speaker's unstable window.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorEvent {
    /// The vendor session is established; events may flow downstream.
    Established,
    Final {
        speaker: String,
        words: Vec<String>,
    },
    Partial {
        speaker: String,
        words: Vec<String>,
    },
    /// The vendor will send nothing further.
    Eos,
    Error {
        detail: String,
        fatal: bool,
    },
}

/// Uniform surface over the realtime ASR vendors.
///
/// An adapter is stateless: it knows how to build the vendor URL and
/// handshake and how to read vendor frames into [`VendorEvent`]s. Keepalive
/// and bookkeeping frames parse to an empty vec and are swallowed.
pub trait RealtimeAsrAdapter: Clone + Default + Send + Sync + 'static {
    fn provider_name(&self) -> &'static str;

    fn build_ws_url(&self, api_base: &str, params: &SessionParams) -> url::Url;

    fn build_auth_header(&self, api_key: &str) -> (&'static str, String);

    /// Handshake message sent right after the socket opens, if the vendor
    /// requires one.
    fn initial_message(&self, params: &SessionParams) -> Option<Message>;

    /// Application-level keepalive the vendor expects during idle stretches.
    /// Neither current vendor wants one; protocol pings cover them.
    fn keep_alive_message(&self) -> Option<Message> {
        None
    }

    fn finalize_message(&self) -> Message;

    fn audio_to_message(&self, audio: Bytes) -> Message {
        Message::Binary(audio)
    }

    fn parse_events(&self, raw: &str) -> Vec<VendorEvent>;
}

pub(crate) fn set_ws_scheme(url: &mut url::Url) {
    match url.scheme() {
        "http" => {
            let _ = url.set_scheme("ws");
        }
        "https" => {
            let _ = url.set_scheme("wss");
        }
        _ => {}
    }
}
