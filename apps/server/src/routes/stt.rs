use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use asr_client::{AsrStream, AssemblyAiAdapter, RealtimeAsrAdapter, SpeechmaticsAdapter};
use asr_interface::{ControlMessage, ErrorKind, ServerMessage, SessionParams};
use pipeline::{LiveWorkers, Session};
use translate::{
    DeepLClient, OpenAiClient, RealtimeClient, SentenceSplitter, ToneDetector, TopicSummarizer,
    Translators,
};

use super::AppState;

pub async fn speechmatics(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let api_base = state.env.speechmatics_api_base.clone();
    let api_key = state.env.speechmatics_api_key.clone();
    ws.on_upgrade(move |socket| {
        run_session::<SpeechmaticsAdapter>(socket, state, params, api_base, api_key)
    })
}

pub async fn assemblyai(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let api_base = state.env.assemblyai_api_base.clone();
    let api_key = state.env.assemblyai_api_key.clone();
    ws.on_upgrade(move |socket| {
        run_session::<AssemblyAiAdapter>(socket, state, params, api_base, api_key)
    })
}

/// One client connection end to end: vendor session, translation backends,
/// pipeline, and the three forwarding tasks that tie them together.
async fn run_session<A: RealtimeAsrAdapter>(
    socket: WebSocket,
    state: AppState,
    params: SessionParams,
    api_base: String,
    api_key: String,
) {
    let (mut client_tx, mut client_rx) = socket.split();

    if api_key.is_empty() {
        send_message(
            &mut client_tx,
            &ServerMessage::error(ErrorKind::AsrFatal, "vendor credentials not configured"),
        )
        .await;
        let _ = client_tx.close().await;
        return;
    }

    let mut asr = match AsrStream::<A>::builder()
        .api_base(api_base)
        .api_key(api_key)
        .params(params.clone())
        .connect()
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            let kind = if e.is_fatal() {
                ErrorKind::AsrFatal
            } else {
                ErrorKind::AsrTransient
            };
            tracing::error!(error = %e, "asr_connect_failed");
            send_message(&mut client_tx, &ServerMessage::error(kind, e.to_string())).await;
            let _ = client_tx.close().await;
            return;
        }
    };

    let env = state.env;
    let http = reqwest::Client::new();
    let openai = OpenAiClient::new(
        http.clone(),
        translate::OPENAI_API_BASE,
        &env.openai_api_key,
    );
    let translators = Translators::new(
        params.translator_mode,
        DeepLClient::new(http, &env.deepl_api_base, &env.deepl_api_key),
        RealtimeClient::new(&env.openai_realtime_url, &env.openai_api_key),
    );
    let workers = LiveWorkers::new(
        translators,
        ToneDetector::new(openai.clone()),
        SentenceSplitter::new(openai.clone()),
        TopicSummarizer::new(openai),
    );

    let cancel = CancellationToken::new();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(64);
    let (events_tx, events_rx) = mpsc::channel(64);

    let session = Session::new(&params, workers, outbound_tx.clone(), cancel.clone());
    let session_task = tokio::spawn(session.run(events_rx));

    let audio = asr.audio_handle();

    // Vendor events into the session. The stream ends with a synthetic Eos,
    // so dropping events_tx afterwards is what lets the session flush.
    let pump = tokio::spawn(async move {
        while let Some(event) = asr.next_event().await {
            if events_tx.send(event).await.is_err() {
                break;
            }
        }
        if let Some(detail) = asr.vendor_error() {
            let _ = outbound_tx
                .send(ServerMessage::error(ErrorKind::AsrFatal, detail))
                .await;
        }
    });

    // Session messages out to the client.
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let Ok(json) = serde_json::to_string(&message) else {
                continue;
            };
            if client_tx.send(Message::Text(json.into())).await.is_err() {
                writer_cancel.cancel();
                break;
            }
        }
        let _ = client_tx.close().await;
    });

    // Client frames to the vendor, on this task.
    while let Some(frame) = client_rx.next().await {
        match frame {
            Ok(Message::Binary(chunk)) => {
                if audio.send_audio(chunk).await.is_err() {
                    break;
                }
            }
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ControlMessage>(text.as_str()) {
                    Ok(ControlMessage::Finalize) => {
                        let _ = audio.finalize().await;
                    }
                    Ok(ControlMessage::CloseStream) => break,
                    Ok(ControlMessage::KeepAlive) => {}
                    Err(_) => tracing::debug!("unrecognized_client_frame"),
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    tracing::info!("client_disconnected");
    cancel.cancel();
    audio.close();
    let _ = session_task.await;
    pump.abort();
    let _ = writer.await;
}

async fn send_message(sink: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) {
    if let Ok(json) = serde_json::to_string(message) {
        let _ = sink.send(Message::Text(json.into())).await;
    }
}
