use crate::consts::{BOT_APP_KEY, BOT_SERVER_URL, BOT_TOKEN, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SERVER_URL};
use secrecy::SecretString;
use std::env;
use tracing::Level;

/// Connection settings for the bot backend.
#[derive(Debug)]
pub struct Config {
    url: String,
    app_key: String,
    token: Option<SecretString>,
    channel_capacity: usize,
    log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.config.url = url.to_string();
        self
    }

    pub fn with_app_key(mut self, app_key: &str) -> Self {
        self.config.app_key = app_key.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.config.token = Some(SecretString::from(token.to_string()));
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            app_key: String::new(),
            token: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_level: Level::INFO,
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Loads configuration from environment variables.
    ///
    // *   `BOT_APP_KEY`: key of the bot application. Required.
    // *   `BOT_SERVER_URL`: (Optional) WebSocket endpoint. Defaults to `DEFAULT_SERVER_URL`.
    // *   `BOT_TOKEN`: (Optional) bearer token forwarded in `Init` and the upgrade request.
    // *   `RUST_LOG`: (Optional) "TRACE", "DEBUG", "INFO", "WARN" or "ERROR". Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Ignored if not present.
        dotenvy::dotenv().ok();

        let app_key = env::var(BOT_APP_KEY).map_err(|_| ConfigError::MissingVar(BOT_APP_KEY.to_string()))?;
        let url = env::var(BOT_SERVER_URL).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let token = env::var(BOT_TOKEN).ok().map(SecretString::from);

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            url,
            app_key,
            token,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_level,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }
}
