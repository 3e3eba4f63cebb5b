//! Application configuration. Provider credentials, zones, paths.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// LLM provider key: "openai" (default), "openrouter", or "mock".
    /// Read from CAL_SYNC_LLM_PROVIDER. Without an API key the app falls
    /// back to the offline provider regardless.
    #[serde(default)]
    pub llm_provider: Option<String>,

    /// LLM API key. Read from CAL_SYNC_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Full chat-completions endpoint. Defaults per provider. Read from
    /// CAL_SYNC_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// Model name. Defaults to "gpt-4o-mini". Read from CAL_SYNC_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Sampling temperature. Defaults to 0.2. Read from CAL_SYNC_AI_TEMPERATURE.
    #[serde(default)]
    pub ai_temperature: Option<f32>,

    /// Process-wide default IANA zone. Read from CAL_SYNC_TIMEZONE.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Base directory for the SQLite store. Read from CAL_SYNC_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Google Calendar Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// OAuth client id. Read from CAL_SYNC_GOOGLE_CLIENT_ID or GOOGLE_CLIENT_ID.
    #[serde(default)]
    pub google_client_id: Option<String>,

    /// OAuth client secret. Read from CAL_SYNC_GOOGLE_CLIENT_SECRET or GOOGLE_CLIENT_SECRET.
    #[serde(default)]
    pub google_client_secret: Option<String>,

    /// Token seed: path to a token JSON file, or the JSON itself.
    /// Read from CAL_SYNC_GOOGLE_TOKEN_JSON or GOOGLE_TOKEN_JSON.
    #[serde(default)]
    pub google_token_json: Option<String>,

    /// Calendar to write into. Defaults to "primary". Read from
    /// CAL_SYNC_GOOGLE_CALENDAR_ID.
    #[serde(default)]
    pub google_calendar_id: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CAL_SYNC"));
        if let Ok(path) = std::env::var("CAL_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the default zone name. Defaults to "Europe/Riga" if unset.
    pub fn timezone_or_default(&self) -> String {
        self.timezone
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Europe/Riga".to_string())
    }

    /// Returns the data directory. Defaults to "./data" if unset.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "./data".to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // LLM Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the provider key, lowercased. Defaults to "openai".
    pub fn llm_provider_or_default(&self) -> String {
        self.llm_provider
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "openai".to_string())
            .to_lowercase()
    }

    /// Returns the LLM API key if configured. Reads from config or
    /// CAL_SYNC_AI_API_KEY env.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var("CAL_SYNC_AI_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the chat-completions endpoint. Defaults per provider.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| match self.llm_provider_or_default().as_str() {
                "openrouter" => "https://openrouter.ai/api/v1/chat/completions".to_string(),
                _ => "https://api.openai.com/v1/chat/completions".to_string(),
            })
    }

    /// Returns the model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Returns the sampling temperature. Defaults to 0.2.
    pub fn ai_temperature_or_default(&self) -> f32 {
        self.ai_temperature.unwrap_or(0.2)
    }

    /// Returns true if an LLM API key is present.
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Google Calendar Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the OAuth client id from config or GOOGLE_CLIENT_ID env.
    pub fn google_client_id(&self) -> Option<String> {
        self.google_client_id
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLIENT_ID").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the OAuth client secret from config or GOOGLE_CLIENT_SECRET env.
    pub fn google_client_secret(&self) -> Option<String> {
        self.google_client_secret
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLIENT_SECRET").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the token seed from config or GOOGLE_TOKEN_JSON env.
    pub fn google_token_json(&self) -> Option<String> {
        self.google_token_json
            .clone()
            .or_else(|| std::env::var("GOOGLE_TOKEN_JSON").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the target calendar id. Defaults to "primary".
    pub fn google_calendar_id_or_default(&self) -> String {
        self.google_calendar_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "primary".to_string())
    }

    /// Returns true if Google Calendar can leave dry-run mode: a token seed,
    /// or client credentials to refresh a stored token with.
    pub fn is_google_configured(&self) -> bool {
        self.google_token_json().is_some()
            || (self.google_client_id().is_some() && self.google_client_secret().is_some())
    }
}
