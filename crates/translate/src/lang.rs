//! Target-language knowledge the translation backends need: DeepL codes,
//! which targets accept a formality parameter, and human-readable names for
//! prompt text.

// https://developers.deepl.com/docs/resources/supported-languages
const FORMALITY_TARGETS: &[&str] = &[
    "DE", "ES", "FR", "IT", "JA", "NL", "PL", "PT-BR", "PT-PT", "PT", "RU",
];

const CUSTOM_INSTRUCTION_TARGETS: &[&str] = &["DE", "EN", "ES", "FR", "IT", "JA", "KO", "PT", "ZH"];

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

/// A normalized target-language code, e.g. `ko`, `ja`, `en-US`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLang {
    code: String,
}

impl TargetLang {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_lowercase(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn base(&self) -> &str {
        self.code.split('-').next().unwrap_or(&self.code)
    }

    /// DeepL target code: uppercased, region preserved (`pt-br` → `PT-BR`).
    pub fn deepl_code(&self) -> String {
        match self.code.as_str() {
            // DeepL requires a regioned English/Portuguese target.
            "en" => "EN-US".to_string(),
            "pt" => "PT-BR".to_string(),
            other => other.to_uppercase(),
        }
    }

    pub fn supports_formality(&self) -> bool {
        let code = self.deepl_code();
        FORMALITY_TARGETS.contains(&code.as_str())
            || FORMALITY_TARGETS.contains(&self.base().to_uppercase().as_str())
    }

    pub fn supports_custom_instructions(&self) -> bool {
        CUSTOM_INSTRUCTION_TARGETS.contains(&self.base().to_uppercase().as_str())
    }

    /// Name used in prompt text ("Translate to Korean"). Falls back to the
    /// raw code for languages outside the table; the model copes.
    pub fn display_name(&self) -> &str {
        DISPLAY_NAMES
            .iter()
            .find(|(code, _)| *code == self.base())
            .map(|(_, name)| *name)
            .unwrap_or(&self.code)
    }

    /// Whether the language has a well-defined register system we carry
    /// dedicated instructions for.
    pub fn has_register_table(&self) -> bool {
        matches!(self.base(), "ko" | "ja")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepl_codes_are_uppercased_and_regioned() {
        assert_eq!(TargetLang::new("ko").deepl_code(), "KO");
        assert_eq!(TargetLang::new("en").deepl_code(), "EN-US");
        assert_eq!(TargetLang::new("pt").deepl_code(), "PT-BR");
        assert_eq!(TargetLang::new("pt-PT").deepl_code(), "PT-PT");
    }

    #[test]
    fn formality_support_matches_deepl_targets() {
        assert!(TargetLang::new("ja").supports_formality());
        assert!(TargetLang::new("de").supports_formality());
        assert!(!TargetLang::new("ko").supports_formality());
        assert!(!TargetLang::new("en").supports_formality());
    }

    #[test]
    fn display_names_resolve_from_base_code() {
        assert_eq!(TargetLang::new("ko").display_name(), "Korean");
        assert_eq!(TargetLang::new("pt-BR").display_name(), "Portuguese");
        assert_eq!(TargetLang::new("xx").display_name(), "xx");
    }

    #[test]
    fn register_tables_exist_for_korean_and_japanese() {
        assert!(TargetLang::new("ko").has_register_table());
        assert!(TargetLang::new("ja").has_register_table());
        assert!(!TargetLang::new("es").has_register_table());
    }
}
