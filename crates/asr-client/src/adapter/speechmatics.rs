use asr_interface::SessionParams;
use serde::Deserialize;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use super::{RealtimeAsrAdapter, VendorEvent, set_ws_scheme};

// https://docs.speechmatics.com/rt-api-ref
pub const DEFAULT_API_BASE: &str = "wss://eu2.rt.speechmatics.com/v2";

const SAMPLE_RATE: u32 = 16_000;
const MAX_SPEAKERS: u32 = 10;

/// Speaker label Speechmatics assigns to words it cannot attribute.
const UNKNOWN_SPEAKER: &str = "UU";

#[derive(Debug, Clone, Default)]
pub struct SpeechmaticsAdapter;

#[derive(Debug, Deserialize)]
struct ServerFrame {
    message: String,
    #[serde(default)]
    results: Vec<RecognitionResult>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    content: String,
    #[serde(default)]
    speaker: Option<String>,
}

/// Flatten diarized results into per-speaker word runs, attaching
/// punctuation results to the preceding word so downstream tokens look like
/// `"world."` rather than `"world"`, `"."`.
fn group_words(results: &[RecognitionResult]) -> Vec<(String, Vec<String>)> {
    let mut runs: Vec<(String, Vec<String>)> = Vec::new();

    for result in results {
        let Some(alt) = result.alternatives.first() else {
            continue;
        };

        if result.kind == "punctuation" {
            if let Some((_, words)) = runs.last_mut()
                && let Some(last) = words.last_mut()
            {
                last.push_str(&alt.content);
            }
            continue;
        }

        let speaker = alt
            .speaker
            .clone()
            .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());

        match runs.last_mut() {
            Some((current, words)) if *current == speaker => words.push(alt.content.clone()),
            _ => runs.push((speaker, vec![alt.content.clone()])),
        }
    }

    runs
}

impl RealtimeAsrAdapter for SpeechmaticsAdapter {
    fn provider_name(&self) -> &'static str {
        "speechmatics"
    }

    fn build_ws_url(&self, api_base: &str, _params: &SessionParams) -> url::Url {
        let base = if api_base.is_empty() {
            DEFAULT_API_BASE
        } else {
            api_base
        };
        let mut url: url::Url = base.parse().expect("invalid api_base URL");
        set_ws_scheme(&mut url);
        url
    }

    fn build_auth_header(&self, api_key: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {api_key}"))
    }

    fn initial_message(&self, params: &SessionParams) -> Option<Message> {
        let start = json!({
            "message": "StartRecognition",
            "audio_format": {
                "type": "raw",
                "encoding": "pcm_s16le",
                "sample_rate": SAMPLE_RATE,
            },
            "transcription_config": {
                "language": params.source_lang.as_deref().unwrap_or("en"),
                "enable_partials": true,
                "operating_point": "enhanced",
                "diarization": "speaker",
                "speaker_diarization_config": { "max_speakers": MAX_SPEAKERS },
            },
        });
        Some(Message::Text(start.to_string().into()))
    }

    fn finalize_message(&self) -> Message {
        Message::Text(json!({ "message": "EndOfStream" }).to_string().into())
    }

    fn parse_events(&self, raw: &str) -> Vec<VendorEvent> {
        let Ok(frame) = serde_json::from_str::<ServerFrame>(raw) else {
            tracing::debug!(provider = "speechmatics", "unparseable_vendor_frame");
            return vec![];
        };

        match frame.message.as_str() {
            "RecognitionStarted" => vec![VendorEvent::Established],
            "AddTranscript" => group_words(&frame.results)
                .into_iter()
                .map(|(speaker, words)| VendorEvent::Final { speaker, words })
                .collect(),
            "AddPartialTranscript" => group_words(&frame.results)
                .into_iter()
                .map(|(speaker, words)| VendorEvent::Partial { speaker, words })
                .collect(),
            "EndOfTranscript" => vec![VendorEvent::Eos],
            "Error" => vec![VendorEvent::Error {
                detail: frame.reason.unwrap_or_else(|| "unknown".to_string()),
                fatal: true,
            }],
            // AudioAdded acks, Info, Warning: vendor keepalive noise.
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asr_interface::SessionParams;

    fn transcript_frame(message: &str, results: serde_json::Value) -> String {
        json!({
            "message": message,
            "results": results,
            "metadata": { "transcript": "" },
        })
        .to_string()
    }

    #[test]
    fn start_recognition_carries_language_and_diarization() {
        let adapter = SpeechmaticsAdapter;
        let params = SessionParams {
            source_lang: Some("ko".into()),
            ..Default::default()
        };

        let msg = adapter.initial_message(&params).unwrap();
        let Message::Text(text) = msg else {
            panic!("expected text handshake");
        };
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();

        assert_eq!(value["message"], "StartRecognition");
        assert_eq!(value["transcription_config"]["language"], "ko");
        assert_eq!(value["transcription_config"]["diarization"], "speaker");
        assert_eq!(value["audio_format"]["sample_rate"], 16_000);
    }

    #[test]
    fn recognition_started_establishes_session() {
        let adapter = SpeechmaticsAdapter;
        let events = adapter.parse_events(r#"{"message":"RecognitionStarted","id":"x"}"#);
        assert_eq!(events, vec![VendorEvent::Established]);
    }

    #[test]
    fn audio_added_is_swallowed() {
        let adapter = SpeechmaticsAdapter;
        assert!(
            adapter
                .parse_events(r#"{"message":"AudioAdded","seq_no":17}"#)
                .is_empty()
        );
        assert!(
            adapter
                .parse_events(r#"{"message":"Info","type":"recognition_quality"}"#)
                .is_empty()
        );
    }

    #[test]
    fn final_transcript_groups_by_speaker() {
        let adapter = SpeechmaticsAdapter;
        let raw = transcript_frame(
            "AddTranscript",
            json!([
                { "type": "word", "alternatives": [{ "content": "Hello", "speaker": "S1" }] },
                { "type": "word", "alternatives": [{ "content": "there", "speaker": "S1" }] },
                { "type": "punctuation", "alternatives": [{ "content": ".", "speaker": "S1" }] },
                { "type": "word", "alternatives": [{ "content": "Hi", "speaker": "S2" }] },
            ]),
        );

        let events = adapter.parse_events(&raw);
        assert_eq!(
            events,
            vec![
                VendorEvent::Final {
                    speaker: "S1".into(),
                    words: vec!["Hello".into(), "there.".into()],
                },
                VendorEvent::Final {
                    speaker: "S2".into(),
                    words: vec!["Hi".into()],
                },
            ]
        );
    }

    #[test]
    fn partial_transcript_maps_to_partial_events() {
        let adapter = SpeechmaticsAdapter;
        let raw = transcript_frame(
            "AddPartialTranscript",
            json!([
                { "type": "word", "alternatives": [{ "content": "so", "speaker": "S1" }] },
            ]),
        );

        let events = adapter.parse_events(&raw);
        assert_eq!(
            events,
            vec![VendorEvent::Partial {
                speaker: "S1".into(),
                words: vec!["so".into()],
            }]
        );
    }

    #[test]
    fn missing_speaker_falls_back_to_unknown_label() {
        let adapter = SpeechmaticsAdapter;
        let raw = transcript_frame(
            "AddPartialTranscript",
            json!([{ "type": "word", "alternatives": [{ "content": "hm" }] }]),
        );

        let events = adapter.parse_events(&raw);
        assert_eq!(
            events,
            vec![VendorEvent::Partial {
                speaker: "UU".into(),
                words: vec!["hm".into()],
            }]
        );
    }

    #[test]
    fn end_of_transcript_is_eos() {
        let adapter = SpeechmaticsAdapter;
        let events = adapter.parse_events(r#"{"message":"EndOfTranscript"}"#);
        assert_eq!(events, vec![VendorEvent::Eos]);
    }

    #[test]
    fn vendor_error_is_fatal() {
        let adapter = SpeechmaticsAdapter;
        let events =
            adapter.parse_events(r#"{"message":"Error","type":"invalid_model","reason":"bad"}"#);
        assert_eq!(
            events,
            vec![VendorEvent::Error {
                detail: "bad".into(),
                fatal: true,
            }]
        );
    }
}
