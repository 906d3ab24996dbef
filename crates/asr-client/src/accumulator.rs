use std::collections::BTreeMap;

use asr_interface::{AsrEvent, AsrWord};

use crate::adapter::VendorEvent;

#[derive(Debug, Default)]
struct SpeakerWords {
    finals: Vec<String>,
    /// Uncommitted window; wholesale-replaced by each partial and cleared
    /// when the vendor commits the segment.
    window: Vec<String>,
}

impl SpeakerWords {
    fn snapshot(&self, speaker: &str) -> AsrEvent {
        let words = self
            .finals
            .iter()
            .map(|w| AsrWord::new(w.clone(), true))
            .chain(self.window.iter().map(|w| AsrWord::new(w.clone(), false)))
            .collect();
        AsrEvent::update(speaker, words)
    }
}

/// Folds per-frame vendor deltas into a full transcript snapshot per
/// speaker.
///
/// Vendors report two granularities: committed words that only ever append,
/// and an unstable window that is re-sent in full on every update. The
/// pipeline wants neither: it wants the speaker's entire word sequence on
/// every event so it can re-derive the unsealed tail itself. This type owns
/// that fold.
///
/// A committed segment closes the unstable window for *every* speaker: the
/// window describes the same stretch of audio the commit just resolved, so
/// leaving other speakers' windows in place would double their words on the
/// next update.
#[derive(Debug, Default)]
pub struct SpeakerAccumulator {
    speakers: BTreeMap<String, SpeakerWords>,
}

impl SpeakerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one vendor word event, returning the snapshot update to push
    /// downstream. Non-word events (`Established`, `Eos`, `Error`) are the
    /// live layer's concern and return nothing here.
    pub fn apply(&mut self, event: VendorEvent) -> Option<AsrEvent> {
        match event {
            VendorEvent::Final { speaker, words } => {
                for state in self.speakers.values_mut() {
                    state.window.clear();
                }
                let state = self.speakers.entry(speaker.clone()).or_default();
                state.finals.extend(words);
                Some(state.snapshot(&speaker))
            }
            VendorEvent::Partial { speaker, words } => {
                let state = self.speakers.entry(speaker.clone()).or_default();
                state.window = words;
                Some(state.snapshot(&speaker))
            }
            VendorEvent::Established | VendorEvent::Eos | VendorEvent::Error { .. } => None,
        }
    }
}
