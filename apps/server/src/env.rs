use std::sync::OnceLock;

use serde::Deserialize;

fn default_port() -> u16 {
    8017
}

fn default_deepl_api_base() -> String {
    translate::DEEPL_API_BASE.to_string()
}

fn default_realtime_url() -> String {
    translate::DEFAULT_REALTIME_URL.to_string()
}

/// Vendor credentials are optional at boot so a deployment can run with a
/// subset of providers; a session against an unconfigured vendor is
/// rejected at open.
#[derive(Deserialize)]
pub struct Env {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub speechmatics_api_key: String,
    #[serde(default)]
    pub speechmatics_api_base: String,

    #[serde(default)]
    pub assemblyai_api_key: String,
    #[serde(default)]
    pub assemblyai_api_base: String,

    #[serde(default)]
    pub deepl_api_key: String,
    #[serde(default = "default_deepl_api_base")]
    pub deepl_api_base: String,

    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_realtime_url")]
    pub openai_realtime_url: String,
}

static ENV: OnceLock<Env> = OnceLock::new();

pub fn env() -> &'static Env {
    ENV.get_or_init(|| {
        let _ = dotenvy::dotenv();
        envy::from_env().expect("Failed to load environment")
    })
}
