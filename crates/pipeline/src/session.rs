use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use asr_interface::{AsrEvent, ErrorKind, ServerMessage, SessionParams};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use translate::{TargetLang, Tone, TranslationRequest};

use crate::speaker::{Action, PipelineConfig, SpeakerState};
use crate::worker::TranslationWorker;

/// Wall-clock without a speaker update before their tail is sealed as-is.
pub const SILENCE_CONFIRM: Duration = Duration::from_secs(3);

const RESULT_CHANNEL_CAPACITY: usize = 256;

/// Completion of any fanned-out task, posted back onto the session loop so
/// all speaker mutations stay on one logical task.
#[derive(Debug)]
enum WorkerResult {
    Confirmed {
        speaker: String,
        id: u64,
        source: String,
        result: Result<String, translate::Error>,
    },
    Partial {
        speaker: String,
        seq: u64,
        result: Result<String, translate::Error>,
    },
    Tone {
        speaker: String,
        result: Result<Tone, translate::Error>,
    },
    Split {
        speaker: String,
        sealed_at: usize,
        result: Result<Option<usize>, translate::Error>,
    },
    Summary {
        speaker: String,
        result: Result<String, translate::Error>,
    },
    SilenceElapsed {
        speaker: String,
        generation: u64,
    },
}

struct SpeakerEntry {
    state: SpeakerState,
    /// Seal ids handed to confirmed-translation tasks, in seal order.
    confirmed_dispatched: u64,
    /// Next seal id whose translation may be surfaced.
    confirmed_released: u64,
    /// Out-of-order completions waiting for their turn. `None` marks a
    /// translation that failed both attempts.
    confirmed_buffer: BTreeMap<u64, (String, Option<String>)>,
    silence_task: Option<JoinHandle<()>>,
    summary_task: Option<JoinHandle<()>>,
}

impl SpeakerEntry {
    fn new(speaker_id: &str) -> Self {
        Self {
            state: SpeakerState::new(speaker_id),
            confirmed_dispatched: 0,
            confirmed_released: 0,
            confirmed_buffer: BTreeMap::new(),
            silence_task: None,
            summary_task: None,
        }
    }
}

impl Drop for SpeakerEntry {
    fn drop(&mut self) {
        if let Some(task) = self.silence_task.take() {
            task.abort();
        }
        if let Some(task) = self.summary_task.take() {
            task.abort();
        }
    }
}

/// One client connection's pipeline: receives uniform ASR events, runs
/// per-speaker segmentation synchronously, fans translation work out to
/// tasks, and serializes every completion back through one channel.
pub struct Session<W: TranslationWorker> {
    session_id: String,
    config: PipelineConfig,
    target: TargetLang,
    worker: Arc<W>,
    speakers: HashMap<String, SpeakerEntry>,
    outbound: mpsc::Sender<ServerMessage>,
    results_tx: mpsc::Sender<WorkerResult>,
    results_rx: mpsc::Receiver<WorkerResult>,
    cancel: CancellationToken,
    /// Cleared on a fatal translator error; the pipeline then serves
    /// transcripts only.
    translations_enabled: bool,
}

impl<W: TranslationWorker> Session<W> {
    pub fn new(
        params: &SessionParams,
        worker: W,
        outbound: mpsc::Sender<ServerMessage>,
        cancel: CancellationToken,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            config: PipelineConfig {
                confirm_punct_count: params.aggressiveness.confirm_punct_count(),
                partial_interval: params.partial_interval(),
            },
            target: TargetLang::new(&params.target_lang),
            worker: Arc::new(worker),
            speakers: HashMap::new(),
            outbound,
            results_tx,
            results_rx,
            cancel,
            translations_enabled: true,
        }
    }

    /// Drive the session until cancellation. The ASR side may end first
    /// (the tail is flushed and translations keep landing); only
    /// cancellation, i.e. client disconnect, ends the loop.
    pub async fn run(mut self, mut events: mpsc::Receiver<AsrEvent>) {
        tracing::info!(
            session_id = %self.session_id,
            target_lang = self.target.code(),
            "session_started"
        );

        let mut events_open = true;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv(), if events_open => {
                    match event {
                        Some(event) if event.is_eos() => self.flush_all().await,
                        Some(event) => self.handle_asr_event(event).await,
                        None => {
                            events_open = false;
                            self.flush_all().await;
                        }
                    }
                }
                result = self.results_rx.recv() => {
                    // The session holds its own sender, so recv cannot fail
                    // while the loop runs.
                    if let Some(result) = result {
                        self.handle_worker_result(result).await;
                    }
                }
            }
        }

        self.cancel.cancel();
        self.worker.close().await;
        tracing::info!(session_id = %self.session_id, "session_closed");
    }

    async fn handle_asr_event(&mut self, event: AsrEvent) {
        let speaker = event.speaker_id.clone();
        let actions = self
            .speakers
            .entry(speaker.clone())
            .or_insert_with(|| SpeakerEntry::new(&speaker))
            .state
            .apply_event(&event.words, &self.config);
        self.process_actions(&speaker, actions).await;
    }

    async fn flush_all(&mut self) {
        let speakers: Vec<String> = self.speakers.keys().cloned().collect();
        for speaker in speakers {
            let actions = match self.speakers.get_mut(&speaker) {
                Some(entry) => entry.state.seal_remaining(),
                None => continue,
            };
            self.process_actions(&speaker, actions).await;
        }
    }

    async fn process_actions(&mut self, speaker: &str, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::EmitConfirmedTranscript { text } => {
                    self.send(ServerMessage::ConfirmedTranscript {
                        speaker: speaker.to_string(),
                        text,
                    })
                    .await;
                }
                Action::EmitPartialTranscript { text } => {
                    self.send(ServerMessage::PartialTranscript {
                        speaker: speaker.to_string(),
                        text,
                    })
                    .await;
                }
                Action::DispatchConfirmed { text } => {
                    if !self.translations_enabled {
                        continue;
                    }
                    let Some(entry) = self.speakers.get_mut(speaker) else {
                        continue;
                    };
                    let id = entry.confirmed_dispatched;
                    entry.confirmed_dispatched += 1;
                    let req = build_request(&entry.state, &self.target, text.clone());

                    let worker = self.worker.clone();
                    let speaker = speaker.to_string();
                    self.spawn_worker(async move {
                        let result = worker.translate_confirmed(req).await;
                        WorkerResult::Confirmed {
                            speaker,
                            id,
                            source: text,
                            result,
                        }
                    });
                }
                Action::DispatchPartial { text, seq } => {
                    if !self.translations_enabled {
                        continue;
                    }
                    let Some(entry) = self.speakers.get(speaker) else {
                        continue;
                    };
                    let req = build_request(&entry.state, &self.target, text);

                    let worker = self.worker.clone();
                    let speaker = speaker.to_string();
                    self.spawn_worker(async move {
                        let result = worker.translate_partial(req).await;
                        WorkerResult::Partial {
                            speaker,
                            seq,
                            result,
                        }
                    });
                }
                Action::DispatchTone { transcript } => {
                    let worker = self.worker.clone();
                    let speaker = speaker.to_string();
                    self.spawn_worker(async move {
                        let result = worker.detect_tone(transcript).await;
                        WorkerResult::Tone { speaker, result }
                    });
                }
                Action::DispatchSplitter { words, sealed_at } => {
                    let worker = self.worker.clone();
                    let speaker = speaker.to_string();
                    self.spawn_worker(async move {
                        let result = worker.propose_boundary(words).await;
                        WorkerResult::Split {
                            speaker,
                            sealed_at,
                            result,
                        }
                    });
                }
                Action::ArmSilenceTimer { generation } => {
                    let tx = self.results_tx.clone();
                    let cancel = self.cancel.clone();
                    let speaker_owned = speaker.to_string();
                    let task = tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(SILENCE_CONFIRM) => {
                                let _ = tx.send(WorkerResult::SilenceElapsed {
                                    speaker: speaker_owned,
                                    generation,
                                }).await;
                            }
                        }
                    });
                    if let Some(entry) = self.speakers.get_mut(speaker) {
                        if let Some(previous) = entry.silence_task.replace(task) {
                            previous.abort();
                        }
                    } else {
                        task.abort();
                    }
                }
            }
        }
    }

    async fn handle_worker_result(&mut self, result: WorkerResult) {
        match result {
            WorkerResult::Confirmed {
                speaker,
                id,
                source,
                result,
            } => {
                let translation = match result {
                    Ok(text) => Some(text),
                    Err(e) => {
                        self.report_translation_error(&e).await;
                        tracing::warn!(
                            speaker = %speaker,
                            error = %e,
                            "confirmed_translation_failed"
                        );
                        None
                    }
                };
                if let Some(entry) = self.speakers.get_mut(&speaker) {
                    entry.confirmed_buffer.insert(id, (source, translation));
                }
                self.release_confirmed(&speaker).await;
            }
            WorkerResult::Partial {
                speaker,
                seq,
                result,
            } => match result {
                Ok(text) => {
                    let surface = self
                        .speakers
                        .get(&speaker)
                        .is_some_and(|e| e.state.should_surface_partial(seq));
                    if surface {
                        self.send(ServerMessage::PartialTranslation {
                            speaker,
                            text,
                        })
                        .await;
                    } else {
                        tracing::debug!(speaker = %speaker, seq, "stale_partial_dropped");
                    }
                }
                Err(e) => {
                    self.report_translation_error(&e).await;
                    tracing::debug!(speaker = %speaker, seq, error = %e, "partial_translation_failed");
                }
            },
            WorkerResult::Tone { speaker, result } => {
                if let Some(entry) = self.speakers.get_mut(&speaker) {
                    match result {
                        Ok(tone) => {
                            tracing::info!(speaker = %speaker, tone = %tone, "tone_detected");
                            entry.state.set_tone(tone);
                        }
                        Err(e) => {
                            tracing::warn!(speaker = %speaker, error = %e, "tone_detection_failed");
                            entry.state.clear_tone_trigger();
                        }
                    }
                }
            }
            WorkerResult::Split {
                speaker,
                sealed_at,
                result,
            } => {
                let actions = match self.speakers.get_mut(&speaker) {
                    Some(entry) => {
                        entry.state.splitter_done();
                        match result {
                            Ok(Some(boundary)) => {
                                entry.state.apply_split(sealed_at, boundary).unwrap_or_default()
                            }
                            Ok(None) => Vec::new(),
                            Err(e) => {
                                tracing::warn!(speaker = %speaker, error = %e, "splitter_failed");
                                Vec::new()
                            }
                        }
                    }
                    None => Vec::new(),
                };
                self.process_actions(&speaker, actions).await;
            }
            WorkerResult::Summary { speaker, result } => {
                if let Some(entry) = self.speakers.get_mut(&speaker) {
                    match result {
                        Ok(summary) => entry.state.set_topic_summary(summary),
                        Err(e) => {
                            tracing::debug!(speaker = %speaker, error = %e, "topic_summary_failed")
                        }
                    }
                }
            }
            WorkerResult::SilenceElapsed {
                speaker,
                generation,
            } => {
                let actions = match self.speakers.get_mut(&speaker) {
                    Some(entry) if entry.state.silence_generation() == generation => {
                        tracing::debug!(speaker = %speaker, "silence_auto_confirm");
                        entry.state.seal_remaining()
                    }
                    _ => Vec::new(),
                };
                self.process_actions(&speaker, actions).await;
            }
        }
    }

    /// Surface confirmed translations strictly in seal order, buffering
    /// whatever completed early.
    async fn release_confirmed(&mut self, speaker: &str) {
        while let Some((message, translated)) = self.take_next_confirmed(speaker) {
            if translated {
                self.dispatch_summary(speaker);
            }
            self.send(message).await;
        }
    }

    fn take_next_confirmed(&mut self, speaker: &str) -> Option<(ServerMessage, bool)> {
        let entry = self.speakers.get_mut(speaker)?;
        let next = entry.confirmed_released;
        let (source, translation) = entry.confirmed_buffer.remove(&next)?;
        entry.confirmed_released += 1;

        let (text, translated) = match translation {
            Some(text) => {
                entry.state.record_confirmed_translation(&source, &text);
                (text, true)
            }
            // Translation loss is acceptable; a stalled caption is not.
            None => (format!("[untranslated] {source}"), false),
        };

        Some((
            ServerMessage::ConfirmedTranslation {
                speaker: speaker.to_string(),
                text,
            },
            translated,
        ))
    }

    /// Regenerate the topic summary off the freshly grown transcript.
    /// Latest wins: a newer dispatch aborts the previous task.
    fn dispatch_summary(&mut self, speaker: &str) {
        let Some(entry) = self.speakers.get_mut(speaker) else {
            return;
        };
        let transcript = entry.state.confirmed_source_text().to_string();

        let worker = self.worker.clone();
        let tx = self.results_tx.clone();
        let cancel = self.cancel.clone();
        let speaker_owned = speaker.to_string();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = worker.summarize(transcript) => {
                    let _ = tx.send(WorkerResult::Summary { speaker: speaker_owned, result }).await;
                }
            }
        });
        if let Some(previous) = entry.summary_task.replace(task) {
            previous.abort();
        }
    }

    async fn report_translation_error(&mut self, error: &translate::Error) {
        if error.is_fatal() && self.translations_enabled {
            self.translations_enabled = false;
            self.send(ServerMessage::error(
                ErrorKind::TranslationFatal,
                error.to_string(),
            ))
            .await;
        }
    }

    fn spawn_worker<F>(&self, fut: F)
    where
        F: Future<Output = WorkerResult> + Send + 'static,
    {
        let tx = self.results_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = fut => {
                    let _ = tx.send(result).await;
                }
            }
        });
    }

    async fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).await.is_err() {
            // Client writer is gone; tear the session down.
            self.cancel.cancel();
        }
    }
}

fn build_request(state: &SpeakerState, target: &TargetLang, text: String) -> TranslationRequest {
    TranslationRequest {
        text,
        target: target.clone(),
        tone: state.tone(),
        context: state.last_confirmed_pair().cloned(),
        topic: state.topic_summary().map(str::to_string),
    }
}
