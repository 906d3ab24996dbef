//! Per-speaker segmentation state machine.
//!
//! The ASR stream is monotonically revised: committed words only append,
//! but the trailing window is rewritten on every update. This module owns
//! the split of that stream into an immutable sealed prefix and a live
//! tail, and decides (synchronously, with no suspension point) which work
//! the session should fan out: transcript emissions, translation
//! dispatches, tone detection, boundary proposals, silence timers.
//!
//! Nothing here performs IO. The session loop applies events, executes the
//! returned [`Action`]s, and feeds worker completions back through the
//! staleness filters ([`SpeakerState::should_surface_partial`],
//! [`SpeakerState::apply_split`]).

use asr_interface::AsrWord;
use translate::{ContextPair, Tone};

/// Tail length (in words) with no sentence mark before the semantic
/// splitter is consulted.
pub const SPLITTER_MIN_TAIL_WORDS: usize = 15;

/// Sealed words required before tone detection dispatches.
pub const TONE_TRIGGER_WORDS: usize = 30;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sentence marks required in the tail before sealing.
    pub confirm_punct_count: usize,
    /// Dispatch a partial translation every N-th update.
    pub partial_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirm_punct_count: 1,
            partial_interval: 6,
        }
    }
}

/// Work the session must carry out after applying an event. Ordering within
/// the vec is meaningful: transcript emissions precede the translation
/// dispatches they correspond to.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    EmitConfirmedTranscript { text: String },
    EmitPartialTranscript { text: String },
    DispatchConfirmed { text: String },
    DispatchPartial { text: String, seq: u64 },
    DispatchTone { transcript: String },
    DispatchSplitter { words: Vec<String>, sealed_at: usize },
    ArmSilenceTimer { generation: u64 },
}

#[derive(Debug)]
pub struct SpeakerState {
    speaker_id: String,
    /// All words seen for this speaker; `[0, confirmed_word_count)` is
    /// sealed and never rewritten, the rest tracks the vendor's live view.
    full_text: Vec<String>,
    confirmed_word_count: usize,
    confirmed_source_text: String,
    pending_sentence_marks: usize,
    /// Updates since the last seal, for the partial throttle.
    update_count: u64,
    first_partial_sent: bool,
    last_partial_source: Option<String>,
    /// Word length of the last dispatched partial; a shrinking tail is an
    /// ASR correction and does not re-fire the throttle.
    last_partial_word_len: usize,
    latest_partial_seq: u64,
    partial_stale: bool,
    prev_remaining: Vec<String>,
    /// Accumulated translated sealed text. Kept for context and debugging;
    /// never pushed to the client as a whole.
    confirmed_translation: String,
    last_confirmed_pair: Option<ContextPair>,
    topic_summary: Option<String>,
    tone: Option<Tone>,
    tone_triggered: bool,
    splitter_in_flight: bool,
    silence_generation: u64,
}

impl SpeakerState {
    pub fn new(speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            full_text: Vec::new(),
            confirmed_word_count: 0,
            confirmed_source_text: String::new(),
            pending_sentence_marks: 0,
            update_count: 0,
            first_partial_sent: false,
            last_partial_source: None,
            last_partial_word_len: 0,
            latest_partial_seq: 0,
            partial_stale: true,
            prev_remaining: Vec::new(),
            confirmed_translation: String::new(),
            last_confirmed_pair: None,
            topic_summary: None,
            tone: None,
            tone_triggered: false,
            splitter_in_flight: false,
            silence_generation: 0,
        }
    }

    pub fn speaker_id(&self) -> &str {
        &self.speaker_id
    }

    pub fn confirmed_word_count(&self) -> usize {
        self.confirmed_word_count
    }

    pub fn confirmed_source_text(&self) -> &str {
        &self.confirmed_source_text
    }

    pub fn pending_sentence_marks(&self) -> usize {
        self.pending_sentence_marks
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone
    }

    /// Tone moves unset → concrete exactly once; later results are ignored.
    pub fn set_tone(&mut self, tone: Tone) {
        if self.tone.is_none() {
            self.tone = Some(tone);
        }
    }

    /// A failed or unclear detection may be retried at a later threshold
    /// crossing.
    pub fn clear_tone_trigger(&mut self) {
        if self.tone.is_none() {
            self.tone_triggered = false;
        }
    }

    pub fn splitter_done(&mut self) {
        self.splitter_in_flight = false;
    }

    /// Record a surfaced confirmed translation: grows the debugging
    /// accumulation and refreshes the one-pair translator context.
    pub fn record_confirmed_translation(&mut self, source: &str, translation: &str) {
        if self.confirmed_translation.is_empty() {
            self.confirmed_translation = translation.to_string();
        } else {
            self.confirmed_translation.push(' ');
            self.confirmed_translation.push_str(translation);
        }
        self.last_confirmed_pair = Some(ContextPair {
            source: source.to_string(),
            translation: translation.to_string(),
        });
    }

    pub fn last_confirmed_pair(&self) -> Option<&ContextPair> {
        self.last_confirmed_pair.as_ref()
    }

    pub fn confirmed_translation(&self) -> &str {
        &self.confirmed_translation
    }

    pub fn topic_summary(&self) -> Option<&str> {
        self.topic_summary.as_deref()
    }

    pub fn set_topic_summary(&mut self, summary: String) {
        self.topic_summary = Some(summary);
    }

    pub fn silence_generation(&self) -> u64 {
        self.silence_generation
    }

    /// Staleness filter for partial completions: anything from before the
    /// newest request, or arriving while a seal is pending a fresh partial,
    /// is dropped.
    pub fn should_surface_partial(&self, seq: u64) -> bool {
        !self.partial_stale && seq >= self.latest_partial_seq
    }

    fn remaining(&self) -> &[String] {
        &self.full_text[self.confirmed_word_count.min(self.full_text.len())..]
    }

    pub fn remaining_text(&self) -> String {
        self.remaining().join(" ")
    }

    /// Apply one ASR update. Returns the work to fan out, in order.
    pub fn apply_event(&mut self, words: &[AsrWord], config: &PipelineConfig) -> Vec<Action> {
        let incoming: Vec<String> = words.iter().map(|w| w.text.clone()).collect();

        // The sealed prefix is inviolate; only the tail follows the vendor.
        let sealed = self.confirmed_word_count.min(incoming.len());
        self.full_text.truncate(self.confirmed_word_count);
        self.full_text.extend_from_slice(&incoming[sealed..]);

        let remaining: Vec<String> = self.remaining().to_vec();

        if is_duplicate(&self.prev_remaining, &remaining) {
            // Activity still counts: the throttle clock ticks and the
            // silence timer re-arms, but nothing is re-emitted.
            self.update_count += 1;
            self.silence_generation += 1;
            return vec![Action::ArmSilenceTimer {
                generation: self.silence_generation,
            }];
        }
        self.prev_remaining = remaining.clone();
        self.update_count += 1;

        let mut actions = Vec::new();

        let marks = sentence_marks(&remaining);
        self.pending_sentence_marks = marks.len();

        if marks.len() >= config.confirm_punct_count {
            let boundary = marks[config.confirm_punct_count - 1] + 1;
            self.seal(boundary, &mut actions);
        }

        self.check_tone_trigger(&mut actions);

        let remaining: Vec<String> = self.remaining().to_vec();

        if remaining.len() > SPLITTER_MIN_TAIL_WORDS
            && sentence_marks(&remaining).is_empty()
            && !self.splitter_in_flight
        {
            self.splitter_in_flight = true;
            actions.push(Action::DispatchSplitter {
                words: remaining.clone(),
                sealed_at: self.confirmed_word_count,
            });
        }

        if !remaining.is_empty() {
            actions.push(Action::EmitPartialTranscript {
                text: remaining.join(" "),
            });
            self.maybe_dispatch_partial(&remaining, config, &mut actions);
        }

        self.silence_generation += 1;
        actions.push(Action::ArmSilenceTimer {
            generation: self.silence_generation,
        });

        actions
    }

    /// Seal the entire tail, as the silence timer or an end-of-stream flush
    /// does.
    pub fn seal_remaining(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let tail_len = self.remaining().len();
        if tail_len > 0 {
            self.seal(tail_len, &mut actions);
            self.check_tone_trigger(&mut actions);
            self.prev_remaining.clear();
        }
        actions
    }

    /// Apply a splitter verdict. `sealed_at` is the seal pointer observed
    /// when the splitter was dispatched; any seal since then makes the
    /// proposal stale.
    pub fn apply_split(&mut self, sealed_at: usize, boundary: usize) -> Option<Vec<Action>> {
        if self.confirmed_word_count != sealed_at {
            tracing::debug!(speaker = %self.speaker_id, "splitter_result_stale");
            return None;
        }
        if boundary == 0 || boundary >= self.remaining().len() {
            return None;
        }

        let mut actions = Vec::new();
        self.seal(boundary, &mut actions);
        self.check_tone_trigger(&mut actions);
        self.prev_remaining = self.remaining().to_vec();
        Some(actions)
    }

    fn seal(&mut self, tail_boundary: usize, actions: &mut Vec<Action>) {
        let sentence = self.full_text
            [self.confirmed_word_count..self.confirmed_word_count + tail_boundary]
            .join(" ");
        self.confirmed_word_count += tail_boundary;

        if self.confirmed_source_text.is_empty() {
            self.confirmed_source_text = sentence.clone();
        } else {
            self.confirmed_source_text.push(' ');
            self.confirmed_source_text.push_str(&sentence);
        }

        // Anything translated against the pre-seal tail is now worthless.
        self.partial_stale = true;
        self.last_partial_source = None;
        self.last_partial_word_len = 0;
        self.update_count = 0;
        self.pending_sentence_marks = 0;

        actions.push(Action::EmitConfirmedTranscript {
            text: sentence.clone(),
        });
        actions.push(Action::DispatchConfirmed { text: sentence });
    }

    fn check_tone_trigger(&mut self, actions: &mut Vec<Action>) {
        if self.tone_triggered || self.tone.is_some() {
            return;
        }
        if self.confirmed_source_text.split_whitespace().count() >= TONE_TRIGGER_WORDS {
            self.tone_triggered = true;
            actions.push(Action::DispatchTone {
                transcript: self.confirmed_source_text.clone(),
            });
        }
    }

    fn maybe_dispatch_partial(
        &mut self,
        remaining: &[String],
        config: &PipelineConfig,
        actions: &mut Vec<Action>,
    ) {
        let interval = config.partial_interval.max(1) as u64;
        let throttle_hit = if !self.first_partial_sent {
            // First caption for a fresh speaker should not wait out the
            // throttle.
            true
        } else {
            self.update_count % interval == 0
        };
        if !throttle_hit {
            return;
        }

        if remaining.len() < self.last_partial_word_len {
            return;
        }

        let text = remaining.join(" ");
        if self.last_partial_source.as_deref() == Some(text.as_str()) {
            return;
        }

        self.first_partial_sent = true;
        self.last_partial_source = Some(text.clone());
        self.last_partial_word_len = remaining.len();
        self.latest_partial_seq += 1;
        self.partial_stale = false;

        actions.push(Action::DispatchPartial {
            text,
            seq: self.latest_partial_seq,
        });
    }
}

fn sentence_marks(words: &[String]) -> Vec<usize> {
    words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.ends_with(['.', '!', '?']))
        .map(|(i, _)| i)
        .collect()
}

/// Updates that only jitter the last word by a couple of trailing
/// characters are vendor noise, not new speech. A shorter tail is a real
/// correction and always reprocesses.
fn is_duplicate(prev: &[String], next: &[String]) -> bool {
    if next.len() < prev.len() || prev.is_empty() {
        return false;
    }
    if prev == next {
        return true;
    }
    if next.len() != prev.len() {
        return false;
    }
    let last = prev.len() - 1;
    if prev[..last] != next[..last] {
        return false;
    }

    let a: Vec<char> = prev[last].chars().collect();
    let b: Vec<char> = next[last].chars().collect();
    let common = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    a.len() - common <= 2 && b.len() - common <= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<AsrWord> {
        texts.iter().map(|t| AsrWord::new(*t, false)).collect()
    }

    fn config(confirm_punct_count: usize, partial_interval: usize) -> PipelineConfig {
        PipelineConfig {
            confirm_punct_count,
            partial_interval,
        }
    }

    fn confirmed_dispatches(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::DispatchConfirmed { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn partial_dispatches(actions: &[Action]) -> Vec<(&str, u64)> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::DispatchPartial { text, seq } => Some((text.as_str(), *seq)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_sentence_high_aggressiveness_seals_immediately() {
        let mut state = SpeakerState::new("S1");
        let actions = state.apply_event(&words(&["Hello", "world."]), &config(1, 6));

        assert_eq!(confirmed_dispatches(&actions), vec!["Hello world."]);
        assert_eq!(state.confirmed_word_count(), 2);
        assert_eq!(state.confirmed_source_text(), "Hello world.");
        assert!(partial_dispatches(&actions).is_empty());
        assert!(
            !actions
                .iter()
                .any(|a| matches!(a, Action::EmitPartialTranscript { .. }))
        );
    }

    #[test]
    fn low_aggressiveness_waits_for_second_mark() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(2, 6);

        let first = state.apply_event(&words(&["Hi."]), &cfg);
        assert!(confirmed_dispatches(&first).is_empty());
        assert_eq!(state.pending_sentence_marks(), 1);

        let second = state.apply_event(&words(&["Hi.", "Done."]), &cfg);
        assert_eq!(confirmed_dispatches(&second), vec!["Hi. Done."]);
        assert_eq!(state.confirmed_word_count(), 2);
    }

    #[test]
    fn partial_throttle_fires_early_then_on_interval() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 3);

        let mut dispatched_on = Vec::new();
        let mut tail: Vec<String> = Vec::new();
        for update in 1..=7u64 {
            tail.push(format!("w{update}"));
            let tokens: Vec<AsrWord> = tail.iter().map(|t| AsrWord::new(t.clone(), false)).collect();
            let actions = state.apply_event(&tokens, &cfg);
            if !partial_dispatches(&actions).is_empty() {
                dispatched_on.push(update);
            }
        }

        assert_eq!(dispatched_on, vec![1, 3, 6]);
    }

    #[test]
    fn seal_marks_in_flight_partials_stale() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 3);

        state.apply_event(&words(&["some", "waffling"]), &cfg);
        let seq = 1;
        assert!(state.should_surface_partial(seq));

        state.apply_event(&words(&["some", "waffling", "ends", "here."]), &cfg);
        assert!(
            !state.should_surface_partial(seq),
            "partial from before the seal must be suppressed"
        );
    }

    #[test]
    fn newer_seq_filters_older_partials() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 1);

        state.apply_event(&words(&["one"]), &cfg);
        state.apply_event(&words(&["one", "two"]), &cfg);

        assert!(!state.should_surface_partial(1));
        assert!(state.should_surface_partial(2));
    }

    #[test]
    fn asr_revision_seals_the_revised_text() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 100);

        for n in 1..=5 {
            let tokens: Vec<AsrWord> = ["the", "quick", "brown"][..n.min(3)]
                .iter()
                .map(|t| AsrWord::new(*t, false))
                .collect();
            state.apply_event(&tokens, &cfg);
        }

        let actions = state.apply_event(&words(&["the", "quick", "brown", "fox."]), &cfg);
        assert_eq!(confirmed_dispatches(&actions), vec!["the quick brown fox."]);
    }

    #[test]
    fn sealed_prefix_survives_vendor_revision() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 6);

        state.apply_event(&words(&["Hello", "world."]), &cfg);
        // Vendor rewrites history; the sealed words must not move.
        state.apply_event(&words(&["Hullo", "wurld.", "and", "more"]), &cfg);

        assert_eq!(state.confirmed_source_text(), "Hello world.");
        assert_eq!(state.remaining_text(), "and more");
    }

    #[test]
    fn identical_tail_is_deduplicated() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 1);

        let first = state.apply_event(&words(&["same", "thing"]), &cfg);
        assert!(!partial_dispatches(&first).is_empty());

        let second = state.apply_event(&words(&["same", "thing"]), &cfg);
        assert_eq!(
            second
                .iter()
                .filter(|a| !matches!(a, Action::ArmSilenceTimer { .. }))
                .count(),
            0,
            "duplicate update must only re-arm the silence timer"
        );
    }

    #[test]
    fn trailing_character_jitter_is_deduplicated() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 1);

        state.apply_event(&words(&["counting", "worl"]), &cfg);
        let jitter = state.apply_event(&words(&["counting", "world"]), &cfg);
        assert!(partial_dispatches(&jitter).is_empty());

        // Three trailing characters is a real change.
        let real = state.apply_event(&words(&["counting", "worldly."]), &cfg);
        assert!(!confirmed_dispatches(&real).is_empty());
    }

    #[test]
    fn shorter_tail_forces_reprocessing() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 1);

        state.apply_event(&words(&["a", "b", "c"]), &cfg);
        let corrected = state.apply_event(&words(&["a", "b"]), &cfg);

        assert!(
            corrected
                .iter()
                .any(|a| matches!(a, Action::EmitPartialTranscript { text } if text == "a b"))
        );
    }

    #[test]
    fn correction_does_not_refire_partial_translation() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 1);

        state.apply_event(&words(&["a", "b", "c"]), &cfg);
        let corrected = state.apply_event(&words(&["a", "b"]), &cfg);

        assert!(
            partial_dispatches(&corrected).is_empty(),
            "shrinking tail is an ASR correction, not new speech"
        );
    }

    #[test]
    fn monotone_sealing_over_arbitrary_updates() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 2);
        let stream = [
            vec!["so"],
            vec!["so", "today."],
            vec!["so", "today.", "we"],
            vec!["so", "today.", "we", "cook."],
            vec!["so", "today.", "we", "cook.", "rice"],
        ];

        let mut last_count = 0;
        let mut last_len = 0;
        for update in &stream {
            let tokens: Vec<AsrWord> = update.iter().map(|t| AsrWord::new(*t, false)).collect();
            state.apply_event(&tokens, &cfg);
            assert!(state.confirmed_word_count() >= last_count);
            assert!(state.confirmed_source_text().len() >= last_len);
            last_count = state.confirmed_word_count();
            last_len = state.confirmed_source_text().len();
        }
        assert_eq!(state.confirmed_source_text(), "so today. we cook.");
    }

    #[test]
    fn no_sentence_is_dispatched_twice() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 2);
        let mut sealed: Vec<String> = Vec::new();

        let updates = [
            vec!["One."],
            vec!["One.", "Two."],
            vec!["One.", "Two."],
            vec!["One.", "Two.", "Three."],
        ];
        for update in &updates {
            let tokens: Vec<AsrWord> = update.iter().map(|t| AsrWord::new(*t, false)).collect();
            for action in state.apply_event(&tokens, &cfg) {
                if let Action::DispatchConfirmed { text } = action {
                    sealed.push(text);
                }
            }
        }

        let mut deduped = sealed.clone();
        deduped.dedup();
        assert_eq!(sealed, deduped);
        let all: Vec<String> = sealed.join(" ").split_whitespace().map(String::from).collect();
        assert_eq!(all, vec!["One.", "Two.", "Three."]);
    }

    #[test]
    fn silence_seal_takes_whole_tail() {
        let mut state = SpeakerState::new("S1");
        state.apply_event(&words(&["And", "then"]), &config(1, 6));

        let actions = state.seal_remaining();
        assert_eq!(confirmed_dispatches(&actions), vec!["And then"]);
        assert_eq!(state.confirmed_word_count(), 2);

        // Nothing left: a second fire is a no-op.
        assert!(state.seal_remaining().is_empty());
    }

    #[test]
    fn splitter_dispatches_once_for_long_unpunctuated_tail() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 100);

        let tail: Vec<String> = (0..16).map(|i| format!("w{i}")).collect();
        let tokens: Vec<AsrWord> = tail.iter().map(|t| AsrWord::new(t.clone(), false)).collect();

        let actions = state.apply_event(&tokens, &cfg);
        assert!(
            actions
                .iter()
                .any(|a| matches!(a, Action::DispatchSplitter { words, sealed_at: 0 } if words.len() == 16))
        );

        // Still in flight: no second dispatch.
        let mut longer = tail.clone();
        longer.push("w16".into());
        let tokens: Vec<AsrWord> = longer.iter().map(|t| AsrWord::new(t.clone(), false)).collect();
        let again = state.apply_event(&tokens, &cfg);
        assert!(
            !again
                .iter()
                .any(|a| matches!(a, Action::DispatchSplitter { .. }))
        );
    }

    #[test]
    fn splitter_result_applies_as_a_seal() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 100);
        let tail: Vec<String> = (0..16).map(|i| format!("w{i}")).collect();
        let tokens: Vec<AsrWord> = tail.iter().map(|t| AsrWord::new(t.clone(), false)).collect();
        state.apply_event(&tokens, &cfg);

        let actions = state.apply_split(0, 5).unwrap();
        assert_eq!(confirmed_dispatches(&actions), vec!["w0 w1 w2 w3 w4"]);
        assert_eq!(state.confirmed_word_count(), 5);
    }

    #[test]
    fn splitter_result_after_a_seal_is_stale() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 100);
        let tail: Vec<String> = (0..16).map(|i| format!("w{i}")).collect();
        let tokens: Vec<AsrWord> = tail.iter().map(|t| AsrWord::new(t.clone(), false)).collect();
        state.apply_event(&tokens, &cfg);

        // Silence auto-confirm raced ahead of the splitter.
        state.seal_remaining();
        assert!(state.apply_split(0, 5).is_none());
    }

    #[test]
    fn tone_dispatches_once_at_threshold() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 100);

        let mut tone_dispatches = 0;
        let mut prefix: Vec<String> = Vec::new();
        for sentence in 0..12 {
            for word in 0..4 {
                prefix.push(format!("s{sentence}w{word}"));
            }
            if let Some(last) = prefix.last_mut() {
                last.push('.');
            }
            let tokens: Vec<AsrWord> =
                prefix.iter().map(|t| AsrWord::new(t.clone(), false)).collect();
            tone_dispatches += state
                .apply_event(&tokens, &cfg)
                .iter()
                .filter(|a| matches!(a, Action::DispatchTone { .. }))
                .count();
        }

        assert_eq!(tone_dispatches, 1);
        assert!(state.confirmed_source_text().split_whitespace().count() >= TONE_TRIGGER_WORDS);
    }

    #[test]
    fn unclear_tone_may_retry_but_success_is_final() {
        let mut state = SpeakerState::new("S1");
        state.tone_triggered = true;

        state.clear_tone_trigger();
        assert!(!state.tone_triggered);

        state.set_tone(Tone::Formal);
        state.set_tone(Tone::Casual);
        assert_eq!(state.tone(), Some(Tone::Formal));

        // A concrete tone pins the trigger for good.
        state.tone_triggered = true;
        state.clear_tone_trigger();
        assert!(state.tone_triggered);
    }

    #[test]
    fn multi_sentence_update_seals_one_sentence_per_event() {
        let mut state = SpeakerState::new("S1");
        let cfg = config(1, 6);

        let first = state.apply_event(&words(&["One.", "Two.", "tail"]), &cfg);
        assert_eq!(confirmed_dispatches(&first), vec!["One."]);

        let second = state.apply_event(&words(&["One.", "Two.", "tail"]), &cfg);
        assert_eq!(confirmed_dispatches(&second), vec!["Two."]);
        assert_eq!(state.remaining_text(), "tail");
    }
}
