use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use asr_interface::{AsrEventKind, SessionParams};
use asr_client::{AsrStream, AssemblyAiAdapter};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

/// Single-connection mock vendor: replays the given frames, records the
/// upgrade request's auth header, then drains whatever the client sends.
async fn start_mock_vendor(frames: Vec<String>) -> (SocketAddr, Arc<Mutex<Option<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let auth_header = Arc::new(Mutex::new(None));
    let captured = auth_header.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let socket = accept_hdr_async(stream, move |req: &Request, resp: Response| {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            *captured.lock().unwrap() = header;
            Ok(resp)
        })
        .await
        .unwrap();

        let (mut sender, _receiver) = socket.split();
        for frame in frames {
            sender.send(Message::Text(frame.into())).await.unwrap();
        }
        let _ = sender.close().await;
    });

    (addr, auth_header)
}

fn begin() -> String {
    r#"{"type":"Begin","id":"sess-1","expires_at":0}"#.to_string()
}

fn turn(transcript: &str, formatted: bool) -> String {
    let words: Vec<String> = transcript
        .split_whitespace()
        .map(|w| format!(r#"{{"text":"{w}","word_is_final":{formatted}}}"#))
        .collect();
    format!(
        r#"{{"type":"Turn","transcript":"{transcript}","end_of_turn":{formatted},"turn_is_formatted":{formatted},"words":[{}]}}"#,
        words.join(",")
    )
}

#[tokio::test]
async fn streams_uniform_events_and_synthesizes_eos() {
    let (addr, auth_header) = start_mock_vendor(vec![
        begin(),
        turn("hello", false),
        turn("hello world", false),
        turn("Hello world.", true),
        r#"{"type":"Termination","audio_duration_seconds":1,"session_duration_seconds":1}"#
            .to_string(),
    ])
    .await;

    let mut stream = AsrStream::<AssemblyAiAdapter>::builder()
        .api_base(format!("ws://{addr}"))
        .api_key("test-key")
        .params(SessionParams::default())
        .connect()
        .await
        .unwrap();

    let first = stream.next_event().await.unwrap();
    assert_eq!(first.kind, AsrEventKind::Update);
    assert_eq!(first.speaker_id, "default");
    assert_eq!(first.transcript(), "hello");

    let second = stream.next_event().await.unwrap();
    assert_eq!(second.transcript(), "hello world");
    assert!(second.words.iter().all(|w| !w.is_final));

    let third = stream.next_event().await.unwrap();
    assert_eq!(third.transcript(), "Hello world.");
    assert!(third.words.iter().all(|w| w.is_final));

    let eos = stream.next_event().await.unwrap();
    assert!(eos.is_eos());

    assert_eq!(auth_header.lock().unwrap().as_deref(), Some("test-key"));
    assert_eq!(stream.dropped_events(), 0);
}

#[tokio::test]
async fn events_before_session_established_are_dropped() {
    let (addr, _) = start_mock_vendor(vec![
        turn("too early", false),
        begin(),
        turn("on time", false),
    ])
    .await;

    let mut stream = AsrStream::<AssemblyAiAdapter>::builder()
        .api_base(format!("ws://{addr}"))
        .api_key("k")
        .params(SessionParams::default())
        .connect()
        .await
        .unwrap();

    let first = stream.next_event().await.unwrap();
    assert_eq!(first.transcript(), "on time");
}

#[tokio::test]
async fn vendor_disconnect_without_termination_yields_eos() {
    let (addr, _) = start_mock_vendor(vec![begin(), turn("cut off", false)]).await;

    let mut stream = AsrStream::<AssemblyAiAdapter>::builder()
        .api_base(format!("ws://{addr}"))
        .api_key("k")
        .params(SessionParams::default())
        .connect()
        .await
        .unwrap();

    assert_eq!(stream.next_event().await.unwrap().transcript(), "cut off");

    // The mock closes after replaying its frames without ever sending a
    // Termination frame; the stream synthesizes the end-of-stream itself.
    let eos = stream.next_event().await.unwrap();
    assert!(eos.is_eos());
}
