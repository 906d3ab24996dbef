use crate::TranslationRequest;

const SYSTEM_PROMPT: &str = "\
You are a real-time subtitle translator for live audio. Translate to {lang}.

The source text is auto-generated speech recognition, which may contain errors, mishearings, or awkward phrasing. Your job is to convey what the speaker *meant*, not to literally translate the raw transcript.

Rules:
- Translate the speaker's intent, not the literal text
- If the transcript looks garbled or nonsensical, infer the likely meaning from context and translate that
- Produce natural, fluent output as if a native {lang} speaker were explaining the same idea
- Match the speaker's tone and energy
- Output ONLY the translation, nothing else";

/// Translator instructions: the base subtitle prompt plus the register block
/// once a tone is known.
pub(crate) fn build_instructions(req: &TranslationRequest) -> String {
    let mut prompt = SYSTEM_PROMPT.replace("{lang}", req.target.display_name());
    if let Some(tone) = req.tone {
        prompt.push_str("\n\n");
        prompt.push_str(tone.instruction(&req.target));
    }
    prompt
}

/// Context block fed ahead of the text to translate. Layout follows the
/// translator request shape: topic line, then the previous sealed pair.
pub(crate) fn build_context(req: &TranslationRequest) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(topic) = &req.topic {
        parts.push(format!("Topic: {topic}"));
    }
    if let Some(pair) = &req.context {
        parts.push(format!(
            "Previous source: {}\nPrevious translation: {}",
            pair.source, pair.translation
        ));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

pub(crate) fn build_user_content(req: &TranslationRequest) -> String {
    match build_context(req) {
        Some(context) => format!("{context}\n\nTranslate: {}", req.text),
        None => req.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::TargetLang;
    use crate::{ContextPair, Tone};

    fn request() -> TranslationRequest {
        TranslationRequest::new("Hello world.", TargetLang::new("ko"))
    }

    #[test]
    fn instructions_name_the_target_language() {
        let prompt = build_instructions(&request());
        assert!(prompt.contains("Translate to Korean."));
        assert!(!prompt.contains("{lang}"));
    }

    #[test]
    fn tone_appends_register_block() {
        let mut req = request();
        req.tone = Some(Tone::Formal);
        let prompt = build_instructions(&req);
        assert!(prompt.contains("합니다"));
    }

    #[test]
    fn bare_request_has_no_context_block() {
        assert_eq!(build_user_content(&request()), "Hello world.");
    }

    #[test]
    fn context_pair_and_topic_precede_the_text() {
        let mut req = request();
        req.topic = Some("cooking stream".into());
        req.context = Some(ContextPair {
            source: "Chop the onions.".into(),
            translation: "양파를 썰어요.".into(),
        });

        let content = build_user_content(&req);
        assert!(content.starts_with("Topic: cooking stream\n"));
        assert!(content.contains("Previous source: Chop the onions."));
        assert!(content.contains("Previous translation: 양파를 썰어요."));
        assert!(content.ends_with("Translate: Hello world."));
    }
}
