use crate::error::Error;
use crate::openai::{ChatMessage, OpenAiClient};

const SUMMARY_MODEL: &str = "gpt-4o-mini";

const SUMMARY_PROMPT: &str = "\
Summarize the following transcript in under 30 words. Focus on subject matter, key terms, entities, and the speaker's current point.

Transcript:
{transcript}

Summary:";

/// Rolling topic summary of the confirmed transcript, fed back into the
/// translator context so terminology stays coherent across sentences.
#[derive(Clone)]
pub struct TopicSummarizer {
    client: OpenAiClient,
}

impl TopicSummarizer {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    pub async fn summarize(&self, transcript: &str) -> Result<String, Error> {
        let prompt = SUMMARY_PROMPT.replace("{transcript}", transcript);
        self.client
            .complete(SUMMARY_MODEL, &[ChatMessage::user(prompt)], 60, 0.0)
            .await
    }
}
