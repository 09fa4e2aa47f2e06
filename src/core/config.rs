use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
pub const DEFAULT_WEB_ROOT: &str = "./web-ui/src";
/// Browser sessions nobody has touched for this long are dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
/// High on purpose so replies vary between turns.
pub const TEMPERATURE: f32 = 0.8;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("錯誤：找不到 OpenRouter API 金鑰。請在環境變數中設定 OPENROUTER_API_KEY。")]
    MissingApiKey,
    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub system_message: Option<String>,
    pub max_history_turns: Option<usize>,
    pub request_timeout: Option<Duration>,
    pub session_ttl: Duration,
    pub web_root: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENROUTER_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let api_base_url =
            get("BITTERSOUP_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let model = get("BITTERSOUP_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let system_message = get("BITTERSOUP_SYSTEM_MESSAGE");
        let max_history_turns = parse_number(
            "BITTERSOUP_MAX_HISTORY_TURNS",
            get("BITTERSOUP_MAX_HISTORY_TURNS"),
        )?;
        let request_timeout = parse_number(
            "BITTERSOUP_REQUEST_TIMEOUT_SECS",
            get("BITTERSOUP_REQUEST_TIMEOUT_SECS"),
        )?
        .map(Duration::from_secs);
        let session_ttl = parse_number(
            "BITTERSOUP_SESSION_TTL_SECS",
            get("BITTERSOUP_SESSION_TTL_SECS"),
        )?
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SESSION_TTL);
        let web_root = get("BITTERSOUP_WEB_ROOT").unwrap_or_else(|| DEFAULT_WEB_ROOT.to_string());

        Ok(Self {
            api_base_url,
            api_key,
            model,
            temperature: TEMPERATURE,
            system_message,
            max_history_turns,
            request_timeout,
            session_ttl,
            web_root,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { name, value: v })
        })
        .transpose()
}
