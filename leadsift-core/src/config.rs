use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LEADMAGIC_BASE_URL: &str = "https://api.leadmagic.io";

/// Minimum spacing between language-model requests (3 requests per minute).
pub const DEFAULT_OPENAI_INTERVAL: Duration = Duration::from_secs(20);

/// API credentials and endpoints for the enrichment collaborators.
///
/// A collaborator whose key is missing is skipped; the lead row records why.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_min_interval: Duration,
    pub leadmagic_api_key: Option<String>,
    pub leadmagic_base_url: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_min_interval: DEFAULT_OPENAI_INTERVAL,
            leadmagic_api_key: None,
            leadmagic_base_url: DEFAULT_LEADMAGIC_BASE_URL.to_string(),
        }
    }
}

impl EnrichConfig {
    /// Load from the environment, reading a `.env` file first if present.
    pub fn from_env() -> Self {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_min_interval: get("OPENAI_MIN_INTERVAL_SECS")
                .and_then(|secs| secs.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.openai_min_interval),
            leadmagic_api_key: get("LEADMAGIC_API_KEY"),
            leadmagic_base_url: get("LEADMAGIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.leadmagic_base_url),
        }
    }

    pub fn has_openai(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn has_leadmagic(&self) -> bool {
        self.leadmagic_api_key.is_some()
    }
}
