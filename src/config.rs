use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the classification service (`/api/emotion` is appended).
    pub detector_url: String,
    /// Base URL of an OpenAI-compatible API (`/v1/chat/completions` is appended).
    pub llm_base_url: String,
    pub llm_model: String,
    pub api_key: Option<String>,
    pub sample_interval: Duration,
    pub request_timeout: Duration,
    pub export_dir: PathBuf,
    /// Image re-sent on every tick. A blank frame is used when unset.
    pub frame_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detector_url: "http://localhost:8000".to_string(),
            llm_base_url: "https://api.openai.com".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            api_key: None,
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            export_dir: PathBuf::from("."),
            frame_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get("EMOTION_DETECTOR_URL") {
            config.detector_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("LLM_BASE_URL") {
            config.llm_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("LLM_MODEL") {
            config.llm_model = model;
        }
        config.api_key = get("OPENAI_API_KEY");
        if let Some(ms) = get("SAMPLE_INTERVAL_MS") {
            config.sample_interval = parse_millis("SAMPLE_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = get("REQUEST_TIMEOUT_MS") {
            config.request_timeout = parse_millis("REQUEST_TIMEOUT_MS", &ms)?;
        }
        if let Some(dir) = get("EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }
        config.frame_path = get("FRAME_PATH").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = value.parse().map_err(|source| ConfigError::InvalidMillis {
        key,
        value: value.to_string(),
        source,
    })?;
    if ms == 0 {
        return Err(ConfigError::ZeroDuration { key });
    }
    Ok(Duration::from_millis(ms))
}
