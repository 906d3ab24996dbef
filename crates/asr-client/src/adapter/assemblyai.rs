use asr_interface::SessionParams;
use serde::Deserialize;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use super::{RealtimeAsrAdapter, VendorEvent, set_ws_scheme};

// https://www.assemblyai.com/docs/speech-to-text/universal-streaming
pub const DEFAULT_API_BASE: &str = "wss://streaming.assemblyai.com/v3/ws";

const SAMPLE_RATE: u32 = 16_000;

/// The v3 streaming API has no diarization; every event lands under one
/// synthetic speaker.
pub const DEFAULT_SPEAKER: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct AssemblyAiAdapter;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ServerFrame {
    Begin {
        #[allow(dead_code)]
        id: String,
    },
    Turn {
        #[serde(default)]
        end_of_turn: bool,
        #[serde(default)]
        turn_is_formatted: bool,
        #[serde(default)]
        words: Vec<TurnWord>,
        #[serde(default)]
        transcript: String,
    },
    Termination {},
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TurnWord {
    text: String,
}

impl RealtimeAsrAdapter for AssemblyAiAdapter {
    fn provider_name(&self) -> &'static str {
        "assemblyai"
    }

    fn build_ws_url(&self, api_base: &str, _params: &SessionParams) -> url::Url {
        // The vendor autodetects language; source_lang is intentionally not
        // forwarded.
        let base = if api_base.is_empty() {
            DEFAULT_API_BASE
        } else {
            api_base
        };
        let mut url: url::Url = base.parse().expect("invalid api_base URL");
        set_ws_scheme(&mut url);
        url.query_pairs_mut()
            .append_pair("sample_rate", &SAMPLE_RATE.to_string())
            .append_pair("format_turns", "true");
        url
    }

    fn build_auth_header(&self, api_key: &str) -> (&'static str, String) {
        ("Authorization", api_key.to_string())
    }

    fn initial_message(&self, _params: &SessionParams) -> Option<Message> {
        None
    }

    fn finalize_message(&self) -> Message {
        Message::Text(json!({ "type": "Terminate" }).to_string().into())
    }

    fn parse_events(&self, raw: &str) -> Vec<VendorEvent> {
        let Ok(frame) = serde_json::from_str::<ServerFrame>(raw) else {
            tracing::debug!(provider = "assemblyai", "unparseable_vendor_frame");
            return vec![];
        };

        match frame {
            ServerFrame::Begin { .. } => vec![VendorEvent::Established],
            ServerFrame::Turn {
                end_of_turn,
                turn_is_formatted,
                words,
                transcript,
            } => {
                let words: Vec<String> = if words.is_empty() {
                    transcript.split_whitespace().map(str::to_string).collect()
                } else {
                    words.into_iter().map(|w| w.text).collect()
                };
                if words.is_empty() {
                    return vec![];
                }
                if end_of_turn && turn_is_formatted {
                    vec![VendorEvent::Final {
                        speaker: DEFAULT_SPEAKER.to_string(),
                        words,
                    }]
                } else {
                    vec![VendorEvent::Partial {
                        speaker: DEFAULT_SPEAKER.to_string(),
                        words,
                    }]
                }
            }
            ServerFrame::Termination {} => vec![VendorEvent::Eos],
            ServerFrame::Other => vec![],
        }
    }
}
