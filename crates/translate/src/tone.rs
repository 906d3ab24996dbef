use crate::error::Error;
use crate::lang::TargetLang;
use crate::openai::{ChatMessage, OpenAiClient};

/// Words of classified transcript the detector looks back over.
const DETECT_WINDOW_WORDS: usize = 100;

const DETECT_MODEL: &str = "gpt-4o-mini";

const DETECT_PROMPT: &str = "\
Analyze this transcript from a live stream/video and determine the speaker's tone and register.

TRANSCRIPT:
{text}

Choose exactly ONE of these speech register levels that would best match the speaker's tone:

1. casual (friends talking, gaming streams, very relaxed)
   Use when: slang, filler words, addressing chat directly, cursing, incomplete sentences

2. casual_polite (friendly but polite, most YouTube content)
   Use when: conversational but structured, educational but approachable

3. formal (news, lectures, business presentations)
   Use when: professional vocabulary, structured speech, formal setting

4. narrative (documentaries, storytelling, essays)
   Use when: descriptive, third person, explaining concepts with authority

Respond with ONLY the tone name (casual, casual_polite, formal, or narrative). Nothing else.";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Casual,
    CasualPolite,
    Formal,
    Narrative,
}

impl Tone {
    /// DeepL formality parameter, where one applies at all.
    pub fn deepl_formality(&self) -> Option<&'static str> {
        match self {
            Self::Casual => Some("prefer_less"),
            Self::Formal => Some("prefer_more"),
            Self::CasualPolite | Self::Narrative => None,
        }
    }

    /// Register instruction appended to the translator prompt.
    pub fn instruction(&self, target: &TargetLang) -> &'static str {
        let base = target.code().split('-').next().unwrap_or_default();
        match (base, self) {
            ("ko", Self::Casual) => {
                "Use casual Korean (해체/반말). Examples: ~해, ~했어, ~할게, ~인데, ~거든, ~잖아, ~임, ~ㅋㅋ. \
                 Sound natural like talking to friends or streaming. No formal endings."
            }
            ("ko", Self::CasualPolite) => {
                "Use casual polite Korean (해요체). Examples: ~해요, ~했어요, ~할 거예요, ~이에요. \
                 Friendly but polite tone."
            }
            ("ko", Self::Formal) => {
                "Use formal polite Korean (합니다체). Examples: ~합니다, ~했습니다, ~하겠습니다. \
                 Maintain professional, respectful tone throughout."
            }
            ("ko", Self::Narrative) => {
                "Use written/narrative Korean (하다체). Examples: ~한다, ~했다, ~할 것이다, ~이다. \
                 Maintain a descriptive, storytelling tone."
            }
            ("ja", Self::Casual) => {
                "Use casual Japanese (タメ口). Examples: ~だ, ~だよ, ~じゃん, ~っけ. Sound natural and relaxed."
            }
            ("ja", Self::CasualPolite) => {
                "Use polite Japanese (です/ます体). Examples: ~です, ~ました, ~でしょう. Friendly but polite."
            }
            ("ja", Self::Formal) => {
                "Use formal Japanese (敬語). Examples: ~でございます, ~いたします. Maintain professional, respectful tone."
            }
            ("ja", Self::Narrative) => {
                "Use written/narrative Japanese (だ/である体). Examples: ~である, ~した, ~のだ. Descriptive, storytelling tone."
            }
            (_, Self::Casual) => {
                "Use casual, relaxed language. Sound natural like talking to friends. \
                 Use informal expressions and contractions."
            }
            (_, Self::CasualPolite) => "Use a friendly but polite tone. Conversational yet structured.",
            (_, Self::Formal) => {
                "Use formal, professional language. Maintain a respectful and structured tone throughout."
            }
            (_, Self::Narrative) => {
                "Use a written, narrative style. Descriptive and authoritative, like a documentary or essay."
            }
        }
    }
}

/// One-shot register classifier over accumulated source text.
#[derive(Clone)]
pub struct ToneDetector {
    client: OpenAiClient,
}

impl ToneDetector {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    /// Classify the speaker's register from the tail of their transcript.
    /// An answer outside the label set is an [`Error::UnclearLabel`]; the
    /// caller may re-dispatch later.
    pub async fn detect(&self, transcript: &str) -> Result<Tone, Error> {
        let words: Vec<&str> = transcript.split_whitespace().collect();
        let start = words.len().saturating_sub(DETECT_WINDOW_WORDS);
        let window = words[start..].join(" ");

        let prompt = DETECT_PROMPT.replace("{text}", &window);
        let answer = self
            .client
            .complete(DETECT_MODEL, &[ChatMessage::user(prompt)], 10, 0.0)
            .await?;

        let label = answer.trim().to_lowercase();
        label
            .parse::<Tone>()
            .map_err(|_| Error::UnclearLabel(label))
    }
}
