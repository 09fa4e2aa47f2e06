mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, DEFAULT_API_BASE_URL, DEFAULT_MODEL, TEMPERATURE};
