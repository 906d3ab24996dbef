use serde::{Deserialize, Serialize};

/// One recognized token. `is_final` means the vendor has committed the word
/// and will not revise it in a later update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrWord {
    pub text: String,
    pub is_final: bool,
}

impl AsrWord {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsrEventKind {
    Update,
    Eos,
}

/// Provider-agnostic recognition event.
///
/// Every vendor adapter reduces its wire format to this shape before the
/// event reaches the session. `words` is the full current word sequence for
/// the speaker as the vendor sees it; trailing non-final words may be
/// revised by a later `Update`. `Eos` signals that no further events will
/// arrive for this session and carries whatever words remained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrEvent {
    pub speaker_id: String,
    pub words: Vec<AsrWord>,
    pub kind: AsrEventKind,
}

impl AsrEvent {
    pub fn update(speaker_id: impl Into<String>, words: Vec<AsrWord>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            words,
            kind: AsrEventKind::Update,
        }
    }

    pub fn eos(speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            words: Vec::new(),
            kind: AsrEventKind::Eos,
        }
    }

    pub fn is_eos(&self) -> bool {
        self.kind == AsrEventKind::Eos
    }

    pub fn transcript(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_joins_words() {
        let event = AsrEvent::update(
            "S1",
            vec![AsrWord::new("Hello", true), AsrWord::new("world.", false)],
        );
        assert_eq!(event.transcript(), "Hello world.");
    }

    #[test]
    fn eos_has_no_words() {
        let event = AsrEvent::eos("default");
        assert!(event.is_eos());
        assert!(event.words.is_empty());
    }
}
