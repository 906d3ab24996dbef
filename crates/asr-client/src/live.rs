use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asr_interface::{AsrEvent, SessionParams};
use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_util::sync::CancellationToken;

use crate::accumulator::SpeakerAccumulator;
use crate::adapter::{RealtimeAsrAdapter, VendorEvent};
use crate::error::Error;

const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_BACKOFF: Duration = Duration::from_millis(500);

/// Bound on buffered events between the vendor reader and the session loop.
/// Overflow drops the oldest buffered event and counts it.
const EVENT_CAPACITY: usize = 64;

pub struct AsrStreamBuilder<A: RealtimeAsrAdapter> {
    api_base: String,
    api_key: String,
    params: SessionParams,
    _marker: PhantomData<A>,
}

impl<A: RealtimeAsrAdapter> Default for AsrStreamBuilder<A> {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            params: SessionParams::default(),
            _marker: PhantomData,
        }
    }
}

impl<A: RealtimeAsrAdapter> AsrStreamBuilder<A> {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn params(mut self, params: SessionParams) -> Self {
        self.params = params;
        self
    }

    /// Connect to the vendor, retrying transient failures. Auth rejections
    /// (HTTP 401/403 on the upgrade) fail immediately.
    pub async fn connect(self) -> Result<AsrStream<A>, Error> {
        let adapter = A::default();
        let url = adapter.build_ws_url(&self.api_base, &self.params);
        let (header_name, header_value) = adapter.build_auth_header(&self.api_key);

        let mut last: Option<Error> = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            let mut request = url
                .as_str()
                .into_client_request()
                .map_err(|e| Error::Connect {
                    attempts: attempt,
                    last: e.to_string(),
                })?;
            request.headers_mut().insert(
                header_name,
                header_value.parse().map_err(|_| {
                    Error::Auth("credential is not a valid header value".to_string())
                })?,
            );

            match connect_async(request).await {
                Ok((socket, _)) => {
                    return AsrStream::start(adapter, socket, &self.params).await;
                }
                Err(tokio_tungstenite::tungstenite::Error::Http(response))
                    if response.status().as_u16() == 401 || response.status().as_u16() == 403 =>
                {
                    return Err(Error::Auth(format!(
                        "{} rejected the upgrade with {}",
                        adapter.provider_name(),
                        response.status()
                    )));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = adapter.provider_name(),
                        attempt,
                        error = %e,
                        "asr_connect_retry"
                    );
                    last = Some(Error::Connect {
                        attempts: attempt,
                        last: e.to_string(),
                    });
                    if attempt < CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_BACKOFF * attempt).await;
                    }
                }
            }
        }

        Err(last.unwrap_or(Error::Closed))
    }
}

/// Live vendor session with a narrow consumer surface: push audio in, pull
/// uniform [`AsrEvent`]s out. A reader task folds vendor frames through the
/// [`SpeakerAccumulator`]; a writer task owns the socket sink.
pub struct AsrStream<A: RealtimeAsrAdapter> {
    adapter: A,
    events: broadcast::Receiver<AsrEvent>,
    outbound: mpsc::Sender<Message>,
    dropped: Arc<AtomicU64>,
    vendor_error: Arc<Mutex<Option<String>>>,
    cancel: CancellationToken,
}

impl<A: RealtimeAsrAdapter> AsrStream<A> {
    pub fn builder() -> AsrStreamBuilder<A> {
        AsrStreamBuilder::default()
    }

    async fn start(
        adapter: A,
        socket: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        params: &SessionParams,
    ) -> Result<Self, Error> {
        let (mut sink, stream) = socket.split();

        if let Some(handshake) = adapter.initial_message(params) {
            sink.send(handshake).await?;
        }

        let (event_tx, events) = broadcast::channel(EVENT_CAPACITY);
        let (outbound, outbound_rx) = mpsc::channel::<Message>(32);
        let dropped = Arc::new(AtomicU64::new(0));
        let vendor_error = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        tokio::spawn(read_loop(
            adapter.clone(),
            stream,
            event_tx,
            vendor_error.clone(),
            cancel.clone(),
        ));
        tokio::spawn(write_loop(sink, outbound_rx, cancel.clone()));

        Ok(Self {
            adapter,
            events,
            outbound,
            dropped,
            vendor_error,
            cancel,
        })
    }

    /// Next uniform event, or `None` once the vendor session is over. Events
    /// lost to the bounded buffer are counted and logged, never surfaced.
    pub async fn next_event(&mut self) -> Option<AsrEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    let total = self.dropped.fetch_add(n, Ordering::Relaxed) + n;
                    tracing::warn!(
                        provider = self.adapter.provider_name(),
                        dropped = n,
                        dropped_total = total,
                        "asr_events_dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub async fn send_audio(&self, audio: Bytes) -> Result<(), Error> {
        self.outbound
            .send(self.adapter.audio_to_message(audio))
            .await
            .map_err(|_| Error::Closed)
    }

    /// Cheap handle for the audio-forwarding side, so the stream itself can
    /// be moved into whatever task consumes events.
    pub fn audio_handle(&self) -> AsrAudioHandle<A> {
        AsrAudioHandle {
            adapter: self.adapter.clone(),
            outbound: self.outbound.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Ask the vendor to flush and end the session.
    pub async fn finalize(&self) -> Result<(), Error> {
        self.outbound
            .send(self.adapter.finalize_message())
            .await
            .map_err(|_| Error::Closed)
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Error the vendor reported mid-stream, if any.
    pub fn vendor_error(&self) -> Option<String> {
        self.vendor_error.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl<A: RealtimeAsrAdapter> Drop for AsrStream<A> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Write-side handle to a live vendor session.
pub struct AsrAudioHandle<A: RealtimeAsrAdapter> {
    adapter: A,
    outbound: mpsc::Sender<Message>,
    cancel: CancellationToken,
}

impl<A: RealtimeAsrAdapter> AsrAudioHandle<A> {
    pub async fn send_audio(&self, audio: Bytes) -> Result<(), Error> {
        self.outbound
            .send(self.adapter.audio_to_message(audio))
            .await
            .map_err(|_| Error::Closed)
    }

    pub async fn finalize(&self) -> Result<(), Error> {
        self.outbound
            .send(self.adapter.finalize_message())
            .await
            .map_err(|_| Error::Closed)
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

async fn read_loop<A, S>(
    adapter: A,
    mut stream: S,
    event_tx: broadcast::Sender<AsrEvent>,
    vendor_error: Arc<Mutex<Option<String>>>,
    cancel: CancellationToken,
) where
    A: RealtimeAsrAdapter,
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut accumulator = SpeakerAccumulator::new();
    let mut established = false;

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = stream.next() => frame,
        };

        let raw = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => {
                // Vendor went away; give the pipeline a chance to flush.
                let _ = event_tx.send(AsrEvent::eos(""));
                break;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(provider = adapter.provider_name(), error = %e, "asr_read_error");
                let _ = event_tx.send(AsrEvent::eos(""));
                break;
            }
        };

        for vendor_event in adapter.parse_events(raw.as_str()) {
            match vendor_event {
                VendorEvent::Established => {
                    tracing::info!(provider = adapter.provider_name(), "asr_session_established");
                    established = true;
                }
                VendorEvent::Eos => {
                    let _ = event_tx.send(AsrEvent::eos(""));
                    return;
                }
                VendorEvent::Error { detail, fatal } => {
                    tracing::error!(
                        provider = adapter.provider_name(),
                        fatal,
                        detail = %detail,
                        "asr_vendor_error"
                    );
                    if let Ok(mut slot) = vendor_error.lock() {
                        *slot = Some(detail);
                    }
                    if fatal {
                        let _ = event_tx.send(AsrEvent::eos(""));
                        return;
                    }
                }
                word_event => {
                    if !established {
                        tracing::warn!(
                            provider = adapter.provider_name(),
                            "asr_event_before_session_established"
                        );
                        continue;
                    }
                    if let Some(update) = accumulator.apply(word_event) {
                        let _ = event_tx.send(update);
                    }
                }
            }
        }
    }
}

async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Message>,
    cancel: CancellationToken,
) where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = outbound.recv() => message,
        };
        let Some(message) = message else { break };
        if let Err(e) = sink.send(message).await {
            tracing::warn!(error = %e, "asr_write_error");
            break;
        }
    }
    let _ = sink.close().await;
}
