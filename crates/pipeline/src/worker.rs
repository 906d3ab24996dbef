use std::future::Future;
use std::pin::Pin;

use translate::{
    Error, SentenceSplitter, Tone, ToneDetector, TopicSummarizer, TranslationRequest, Translators,
};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Everything the session fans out to the network, behind one seam so the
/// state machine can be driven in tests without sockets.
pub trait TranslationWorker: Send + Sync + 'static {
    fn translate_confirmed(&self, req: TranslationRequest) -> BoxFuture<Result<String, Error>>;

    fn translate_partial(&self, req: TranslationRequest) -> BoxFuture<Result<String, Error>>;

    fn detect_tone(&self, transcript: String) -> BoxFuture<Result<Tone, Error>>;

    fn propose_boundary(&self, words: Vec<String>) -> BoxFuture<Result<Option<usize>, Error>>;

    fn summarize(&self, transcript: String) -> BoxFuture<Result<String, Error>>;

    fn close(&self) -> BoxFuture<()>;
}

/// Production wiring over the translate crate's clients.
pub struct LiveWorkers {
    translators: Translators,
    tone: ToneDetector,
    splitter: SentenceSplitter,
    summarizer: TopicSummarizer,
}

impl LiveWorkers {
    pub fn new(
        translators: Translators,
        tone: ToneDetector,
        splitter: SentenceSplitter,
        summarizer: TopicSummarizer,
    ) -> Self {
        Self {
            translators,
            tone,
            splitter,
            summarizer,
        }
    }
}

impl TranslationWorker for LiveWorkers {
    fn translate_confirmed(&self, req: TranslationRequest) -> BoxFuture<Result<String, Error>> {
        let translators = self.translators.clone();
        Box::pin(async move { translators.translate_confirmed(&req).await })
    }

    fn translate_partial(&self, req: TranslationRequest) -> BoxFuture<Result<String, Error>> {
        let translators = self.translators.clone();
        Box::pin(async move { translators.translate_partial(&req).await })
    }

    fn detect_tone(&self, transcript: String) -> BoxFuture<Result<Tone, Error>> {
        let tone = self.tone.clone();
        Box::pin(async move { tone.detect(&transcript).await })
    }

    fn propose_boundary(&self, words: Vec<String>) -> BoxFuture<Result<Option<usize>, Error>> {
        let splitter = self.splitter.clone();
        Box::pin(async move { splitter.propose_boundary(&words).await })
    }

    fn summarize(&self, transcript: String) -> BoxFuture<Result<String, Error>> {
        let summarizer = self.summarizer.clone();
        Box::pin(async move { summarizer.summarize(&transcript).await })
    }

    fn close(&self) -> BoxFuture<()> {
        let translators = self.translators.clone();
        Box::pin(async move { translators.close().await })
    }
}
