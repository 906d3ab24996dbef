use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::TranslationRequest;
use crate::error::Error;
use crate::prompt::{build_instructions, build_user_content};

pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime?model=gpt-realtime-mini";

const BACKOFF_INITIAL: Duration = Duration::from_millis(100);
const BACKOFF_FACTOR: u32 = 4;
const BACKOFF_CAP: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(20);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

struct Pending {
    tx: oneshot::Sender<Result<String, Error>>,
    text: String,
}

/// Backend-assigned response ids arrive only in `response.created`, so
/// dispatch order is the only way to pair a request with its id. The send
/// mutex guarantees that order matches `creation_queue` order.
#[derive(Default)]
struct Correlation {
    creation_queue: VecDeque<Pending>,
    in_flight: HashMap<String, Pending>,
}

impl Correlation {
    fn fail_all(&mut self) {
        for pending in self
            .creation_queue
            .drain(..)
            .chain(self.in_flight.drain().map(|(_, p)| p))
        {
            let _ = pending.tx.send(Err(Error::ConnectionLost));
        }
    }
}

struct Connection {
    sink: WsSink,
    correlation: Arc<StdMutex<Correlation>>,
    cancel: CancellationToken,
}

struct ConnState {
    connection: Option<Connection>,
    backoff: Duration,
}

struct Inner {
    url: String,
    api_key: String,
    /// Serializes the send side and connection management.
    conn: Mutex<ConnState>,
}

/// Persistent bidirectional translation backend, shared by every speaker in
/// a session.
///
/// Each translation is an out-of-band request on one long-lived socket: no
/// conversation history is kept server-side, the full instructions ride
/// along on every request. On connection loss, in-flight requests fail fast
/// and the next request reopens the socket under exponential backoff.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                api_key: api_key.into(),
                conn: Mutex::new(ConnState {
                    connection: None,
                    backoff: BACKOFF_INITIAL,
                }),
            }),
        }
    }

    pub async fn translate(&self, req: &TranslationRequest) -> Result<String, Error> {
        let rx = self.dispatch(req).await?;
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectionLost),
        }
    }

    async fn dispatch(
        &self,
        req: &TranslationRequest,
    ) -> Result<oneshot::Receiver<Result<String, Error>>, Error> {
        let mut state = self.inner.conn.lock().await;
        self.ensure_connected(&mut state).await?;
        let conn = state.connection.as_mut().ok_or(Error::ConnectionLost)?;

        let (tx, rx) = oneshot::channel();
        if let Ok(mut correlation) = conn.correlation.lock() {
            correlation.creation_queue.push_back(Pending {
                tx,
                text: String::new(),
            });
        }

        let payload = json!({
            "type": "response.create",
            "response": {
                "modalities": ["text"],
                "instructions": build_instructions(req),
                "conversation": "none",
                "input": [{
                    "type": "message",
                    "role": "user",
                    "content": [{ "type": "input_text", "text": build_user_content(req) }],
                }],
            },
        });

        if let Err(e) = conn
            .sink
            .send(Message::Text(payload.to_string().into()))
            .await
        {
            conn.cancel.cancel();
            if let Ok(mut correlation) = conn.correlation.lock() {
                correlation.fail_all();
            }
            state.connection = None;
            return Err(e.into());
        }

        Ok(rx)
    }

    /// Reconnect if the reader task has died. Loops under backoff; the
    /// caller's translation deadline bounds it.
    async fn ensure_connected(&self, state: &mut ConnState) -> Result<(), Error> {
        if let Some(conn) = &state.connection {
            if !conn.cancel.is_cancelled() {
                return Ok(());
            }
            state.connection = None;
        }

        loop {
            match self.connect_once().await {
                Ok(connection) => {
                    state.backoff = BACKOFF_INITIAL;
                    state.connection = Some(connection);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        delay_ms = state.backoff.as_millis() as u64,
                        "realtime_reconnect_backoff"
                    );
                    tokio::time::sleep(state.backoff).await;
                    state.backoff = (state.backoff * BACKOFF_FACTOR).min(BACKOFF_CAP);
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<Connection, Error> {
        let mut request = self.inner.url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            "Authorization",
            format!("Bearer {}", self.inner.api_key)
                .parse()
                .map_err(|_| Error::Payload("api key is not a valid header value".into()))?,
        );
        headers.insert("OpenAI-Beta", "realtime=v1".parse().expect("static header"));

        let (socket, _) = connect_async(request).await?;
        let (mut sink, stream) = socket.split();

        sink.send(Message::Text(
            json!({
                "type": "session.update",
                "session": {
                    "modalities": ["text"],
                    "temperature": 0.6,
                    "max_response_output_tokens": 200,
                },
            })
            .to_string()
            .into(),
        ))
        .await?;

        let correlation = Arc::new(StdMutex::new(Correlation::default()));
        let cancel = CancellationToken::new();

        tokio::spawn(read_loop(stream, correlation.clone(), cancel.clone()));
        tokio::spawn(ping_loop(self.inner.clone(), cancel.clone()));

        tracing::info!("realtime_translator_connected");
        Ok(Connection {
            sink,
            correlation,
            cancel,
        })
    }

    pub async fn close(&self) {
        let mut state = self.inner.conn.lock().await;
        if let Some(mut conn) = state.connection.take() {
            conn.cancel.cancel();
            let _ = conn.sink.close().await;
            if let Ok(mut correlation) = conn.correlation.lock() {
                correlation.fail_all();
            }
        }
    }
}

async fn read_loop(
    mut stream: WsStream,
    correlation: Arc<StdMutex<Correlation>>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = stream.next() => frame,
        };

        let raw = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "realtime_read_error");
                break;
            }
        };

        let Ok(event) = serde_json::from_str::<serde_json::Value>(raw.as_str()) else {
            continue;
        };

        match event["type"].as_str().unwrap_or_default() {
            "response.created" => {
                let Some(id) = event["response"]["id"].as_str() else {
                    continue;
                };
                if let Ok(mut corr) = correlation.lock()
                    && let Some(pending) = corr.creation_queue.pop_front()
                {
                    corr.in_flight.insert(id.to_string(), pending);
                }
            }
            "response.text.delta" => {
                let (Some(id), Some(delta)) =
                    (event["response_id"].as_str(), event["delta"].as_str())
                else {
                    continue;
                };
                if let Ok(mut corr) = correlation.lock()
                    && let Some(pending) = corr.in_flight.get_mut(id)
                {
                    pending.text.push_str(delta);
                }
            }
            "response.text.done" => {
                let Some(id) = event["response_id"].as_str() else {
                    continue;
                };
                if let Ok(mut corr) = correlation.lock()
                    && let Some(pending) = corr.in_flight.get_mut(id)
                    && let Some(text) = event["text"].as_str()
                {
                    pending.text = text.to_string();
                }
            }
            "response.done" => {
                let Some(id) = event["response"]["id"].as_str() else {
                    continue;
                };
                let pending = correlation
                    .lock()
                    .ok()
                    .and_then(|mut corr| corr.in_flight.remove(id));
                if let Some(pending) = pending {
                    let text = pending.text.trim().to_string();
                    let result = if text.is_empty() {
                        Err(Error::Empty)
                    } else {
                        Ok(text)
                    };
                    let _ = pending.tx.send(result);
                }
            }
            "error" => {
                tracing::warn!(
                    detail = %event["error"]["message"].as_str().unwrap_or("unknown"),
                    "realtime_backend_error"
                );
            }
            // session.created / session.updated acks and the rest.
            _ => {}
        }
    }

    cancel.cancel();
    if let Ok(mut corr) = correlation.lock() {
        corr.fail_all();
    }
    tracing::info!("realtime_translator_disconnected");
}

/// Inactivity ping so idle sessions keep the translator socket open.
async fn ping_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(PING_INTERVAL) => {}
        }

        let mut state = inner.conn.lock().await;
        let Some(conn) = state.connection.as_mut() else {
            return;
        };
        if conn.cancel.is_cancelled() {
            return;
        }
        if conn.sink.send(Message::Ping(Vec::new().into())).await.is_err() {
            conn.cancel.cancel();
            return;
        }
    }
}
