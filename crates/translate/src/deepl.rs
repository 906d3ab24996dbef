use serde::Deserialize;
use serde_json::json;

use crate::TranslationRequest;
use crate::error::Error;
use crate::prompt::build_context;

pub const DEFAULT_API_BASE: &str = "https://api-free.deepl.com";

/// Standing guidance for every custom-instruction request: the source is
/// raw ASR output, not clean prose.
const CUSTOM_INSTRUCTIONS: &[&str] = &[
    "The source text is auto-generated speech recognition which may contain errors or mishearings.",
    "Translate the speaker's intent, not the literal text. Infer meaning from context if the transcript is garbled.",
    "Produce natural, fluent output as if a native speaker were explaining the same idea.",
];

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Quality-optimized backend: one idempotent HTTP/2 request per sealed
/// sentence.
#[derive(Clone)]
pub struct DeepLClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl DeepLClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn translate(&self, req: &TranslationRequest) -> Result<String, Error> {
        let body = build_body(req);

        let response = self
            .http
            .post(format!("{}/v2/translate", self.api_base))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        let text = parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Empty);
        }
        Ok(text)
    }
}

fn build_body(req: &TranslationRequest) -> serde_json::Value {
    let mut body = json!({
        "text": [req.text],
        "target_lang": req.target.deepl_code(),
        "split_sentences": "0",
        "model_type": "quality_optimized",
    });
    let obj = body.as_object_mut().expect("body is an object");

    if let Some(context) = build_context(req) {
        obj.insert("context".to_string(), json!(context));
    }

    if req.target.supports_formality()
        && let Some(formality) = req.tone.and_then(|t| t.deepl_formality())
    {
        obj.insert("formality".to_string(), json!(formality));
    }

    if req.target.supports_custom_instructions() {
        let mut instructions: Vec<String> =
            CUSTOM_INSTRUCTIONS.iter().map(|s| s.to_string()).collect();
        if let Some(tone) = req.tone {
            instructions.push(tone.instruction(&req.target).to_string());
        }
        obj.insert("custom_instructions".to_string(), json!(instructions));
    }

    body
}
