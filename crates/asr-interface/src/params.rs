use serde::{Deserialize, Deserializer, Serialize};

fn default_target_lang() -> String {
    "ko".to_string()
}

fn default_partial_interval() -> usize {
    6
}

/// How many punctuation-terminated boundaries must accumulate in the
/// unsealed tail before a sentence is sealed. Exposed to clients as the
/// integer `aggressiveness` query parameter: 1 seals eagerly, 2 waits for a
/// second boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Aggressiveness {
    #[default]
    High,
    Low,
}

impl Aggressiveness {
    pub fn confirm_punct_count(&self) -> usize {
        match self {
            Self::High => 1,
            Self::Low => 2,
        }
    }
}

impl<'de> Deserialize<'de> for Aggressiveness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "1" | "high" => Ok(Self::High),
            "2" | "low" => Ok(Self::Low),
            other => Err(serde::de::Error::custom(format!(
                "aggressiveness must be 1 or 2, got {other:?}"
            ))),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TranslatorMode {
    #[default]
    Quality,
    Speed,
}

/// Per-session knobs, parsed from the query string at session open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// BCP-47-ish source language hint. Optional for vendors that autodetect.
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    #[serde(default)]
    pub aggressiveness: Aggressiveness,
    #[serde(default = "default_partial_interval")]
    pub partial_interval: usize,
    #[serde(default)]
    pub translator_mode: TranslatorMode,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            source_lang: None,
            target_lang: default_target_lang(),
            aggressiveness: Aggressiveness::default(),
            partial_interval: default_partial_interval(),
            translator_mode: TranslatorMode::default(),
        }
    }
}

impl SessionParams {
    /// Interval clamped so a misconfigured 0 cannot disable partials.
    pub fn partial_interval(&self) -> usize {
        self.partial_interval.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_query_string() {
        let params: SessionParams = serde_urlencoded::from_str(
            "source_lang=en&target_lang=ja&aggressiveness=2&partial_interval=3&translator_mode=speed",
        )
        .unwrap();

        assert_eq!(params.source_lang.as_deref(), Some("en"));
        assert_eq!(params.target_lang, "ja");
        assert_eq!(params.aggressiveness, Aggressiveness::Low);
        assert_eq!(params.partial_interval, 3);
        assert_eq!(params.translator_mode, TranslatorMode::Speed);
    }

    #[test]
    fn defaults_apply_for_empty_query() {
        let params: SessionParams = serde_urlencoded::from_str("").unwrap();

        assert_eq!(params.source_lang, None);
        assert_eq!(params.target_lang, "ko");
        assert_eq!(params.aggressiveness, Aggressiveness::High);
        assert_eq!(params.partial_interval, 6);
        assert_eq!(params.translator_mode, TranslatorMode::Quality);
    }

    #[test]
    fn rejects_unknown_aggressiveness() {
        let result: Result<SessionParams, _> = serde_urlencoded::from_str("aggressiveness=3");
        assert!(result.is_err());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let params = SessionParams {
            partial_interval: 0,
            ..Default::default()
        };
        assert_eq!(params.partial_interval(), 1);
    }
}
