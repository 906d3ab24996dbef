use crate::error::Error;
use crate::openai::{ChatMessage, OpenAiClient};

const SPLIT_MODEL: &str = "gpt-4o-mini";

const SPLIT_PROMPT: &str = "\
The following is a run of live speech transcript with no punctuation. If it contains at least one complete thought, answer with the number of words that make up the FIRST complete thought. If no complete thought has finished yet, answer 0.

Answer with ONLY a number.

Transcript:
{text}";

/// Semantic segmenter for long unpunctuated runs. One LLM call in, at most
/// one boundary out.
#[derive(Clone)]
pub struct SentenceSplitter {
    client: OpenAiClient,
}

impl SentenceSplitter {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    /// Propose the earliest semantic boundary in `words`, as a word count.
    /// `None` means the model saw no finished thought. Counts that would not
    /// actually split the run (0, or the whole tail) also map to `None`.
    pub async fn propose_boundary(&self, words: &[String]) -> Result<Option<usize>, Error> {
        if words.len() < 2 {
            return Ok(None);
        }

        let prompt = SPLIT_PROMPT.replace("{text}", &words.join(" "));
        let answer = self
            .client
            .complete(SPLIT_MODEL, &[ChatMessage::user(prompt)], 8, 0.0)
            .await?;

        let count: usize = answer
            .trim()
            .parse()
            .map_err(|_| Error::UnclearLabel(answer.trim().to_string()))?;

        if count == 0 || count >= words.len() {
            return Ok(None);
        }
        Ok(Some(count))
    }
}
