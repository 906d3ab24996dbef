mod deepl;
mod error;
pub mod lang;
mod openai;
mod prompt;
mod realtime;
mod splitter;
mod summary;
mod tone;

pub use deepl::{DEFAULT_API_BASE as DEEPL_API_BASE, DeepLClient};
pub use error::Error;
pub use lang::TargetLang;
pub use openai::{ChatMessage, DEFAULT_API_BASE as OPENAI_API_BASE, OpenAiClient};
pub use realtime::{DEFAULT_REALTIME_URL, RealtimeClient};
pub use splitter::SentenceSplitter;
pub use summary::TopicSummarizer;
pub use tone::{Tone, ToneDetector};

use std::time::Duration;

use asr_interface::TranslatorMode;

/// Soft deadline on any single translation call. Expiry is a translation
/// error, never a stall.
pub const TRANSLATE_DEADLINE: Duration = Duration::from_secs(5);

/// The most recently sealed source sentence and its translation, supplied
/// verbatim as one-shot context for the next request.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPair {
    pub source: String,
    pub translation: String,
}

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub target: TargetLang,
    pub tone: Option<Tone>,
    pub context: Option<ContextPair>,
    /// Rolling summary of the confirmed transcript, when one exists.
    pub topic: Option<String>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: TargetLang) -> Self {
        Self {
            text: text.into(),
            target,
            tone: None,
            context: None,
            topic: None,
        }
    }
}

/// The two backends behind one dispatch surface.
///
/// The persistent realtime connection always serves partials (latency
/// beats polish for a preview that will be replaced anyway). Confirmed
/// sentences go to the quality backend unless the session asked for speed.
#[derive(Clone)]
pub struct Translators {
    mode: TranslatorMode,
    deepl: DeepLClient,
    realtime: RealtimeClient,
}

impl Translators {
    pub fn new(mode: TranslatorMode, deepl: DeepLClient, realtime: RealtimeClient) -> Self {
        Self {
            mode,
            deepl,
            realtime,
        }
    }

    /// Translate a sealed sentence. Retried once on failure; the caller
    /// decides what to surface when both attempts fail.
    pub async fn translate_confirmed(&self, req: &TranslationRequest) -> Result<String, Error> {
        match self.dispatch_confirmed(req).await {
            Ok(text) => Ok(text),
            Err(first) => {
                tracing::warn!(error = %first, "confirmed_translation_retry");
                self.dispatch_confirmed(req).await
            }
        }
    }

    pub async fn translate_partial(&self, req: &TranslationRequest) -> Result<String, Error> {
        tokio::time::timeout(TRANSLATE_DEADLINE, self.realtime.translate(req))
            .await
            .map_err(|_| Error::Deadline)?
    }

    async fn dispatch_confirmed(&self, req: &TranslationRequest) -> Result<String, Error> {
        let call = async {
            match self.mode {
                TranslatorMode::Quality => self.deepl.translate(req).await,
                TranslatorMode::Speed => self.realtime.translate(req).await,
            }
        };
        tokio::time::timeout(TRANSLATE_DEADLINE, call)
            .await
            .map_err(|_| Error::Deadline)?
    }

    /// Tear down the persistent connection at session end.
    pub async fn close(&self) {
        self.realtime.close().await;
    }
}
