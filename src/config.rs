use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::types::ChatId;

pub const DEFAULT_HTTP_PORT: u16 = 9090;
pub const DEFAULT_WEBHOOK_PORT: u16 = 3001;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FLUSH_SECS: u64 = 5;
const DEFAULT_LOG_BATCH_LINES: usize = 50;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    telegram_bot_token: String,
    /// Yelp Fusion API key
    #[serde(default)]
    yelp_api_key: String,
    /// Port for the front door (`GET /`)
    http_port: Option<u16>,
    /// Port for the outgoing webhook endpoint
    webhook_port: Option<u16>,
    /// Chat that receives operator logs
    log_chat_id: Option<i64>,
    /// Directory for log files. Defaults to current directory.
    data_dir: Option<String>,
    search_timeout_secs: Option<u64>,
    /// Seconds between flushes of batched INFO lines to the log chat
    log_flush_secs: Option<u64>,
    /// Flush early once this many INFO lines are waiting
    log_batch_lines: Option<usize>,
}

pub struct Config {
    pub telegram_bot_token: String,
    pub yelp_api_key: String,
    pub http_port: u16,
    pub webhook_port: u16,
    /// True when neither port came from the file or the environment.
    ports_defaulted: bool,
    pub log_chat_id: Option<ChatId>,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
    pub search_timeout_secs: u64,
    pub log_flush_secs: u64,
    pub log_batch_lines: usize,
}

impl Config {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => read_file(path.as_ref())?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(mut file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(token) = env("TELEGRAM_BOT_TOKEN") {
            file.telegram_bot_token = token;
        }
        if let Some(key) = env("YELP_API_KEY") {
            file.yelp_api_key = key;
        }
        if let Some(port) = env("PORT") {
            file.http_port = Some(parse_env("PORT", &port)?);
        }
        if let Some(port) = env("WEBHOOK_PORT") {
            file.webhook_port = Some(parse_env("WEBHOOK_PORT", &port)?);
        }
        if let Some(id) = env("LOG_CHAT_ID") {
            file.log_chat_id = Some(parse_env("LOG_CHAT_ID", &id)?);
        }
        if let Some(dir) = env("DATA_DIR") {
            file.data_dir = Some(dir);
        }

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.yelp_api_key.trim().is_empty() {
            return Err(ConfigError::Validation("yelp_api_key is required".into()));
        }
        if file.search_timeout_secs == Some(0) {
            return Err(ConfigError::Validation("search_timeout_secs must be positive".into()));
        }

        if file.log_flush_secs == Some(0) {
            return Err(ConfigError::Validation("log_flush_secs must be positive".into()));
        }
        if file.log_batch_lines == Some(0) {
            return Err(ConfigError::Validation("log_batch_lines must be positive".into()));
        }

        let ports_defaulted = file.http_port.is_none() && file.webhook_port.is_none();

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            yelp_api_key: file.yelp_api_key,
            http_port: file.http_port.unwrap_or(DEFAULT_HTTP_PORT),
            webhook_port: file.webhook_port.unwrap_or(DEFAULT_WEBHOOK_PORT),
            ports_defaulted,
            log_chat_id: file.log_chat_id.map(ChatId),
            data_dir: file.data_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            search_timeout_secs: file.search_timeout_secs.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            log_flush_secs: file.log_flush_secs.unwrap_or(DEFAULT_LOG_FLUSH_SECS),
            log_batch_lines: file.log_batch_lines.unwrap_or(DEFAULT_LOG_BATCH_LINES),
        })
    }

    /// The webhook route shares the front door listener.
    pub fn webhook_shares_port(&self) -> bool {
        self.http_port == self.webhook_port
    }

    /// Non-fatal port findings, meant to be logged at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.ports_defaulted {
            warnings.push(format!(
                "no ports configured: front door defaults to {} but webhook server defaults to {}; set PORT and WEBHOOK_PORT explicitly",
                DEFAULT_HTTP_PORT, DEFAULT_WEBHOOK_PORT
            ));
        }
        if self.webhook_shares_port() {
            warnings.push(format!(
                "http_port and webhook_port are both {}; webhook endpoint will be served by the front door",
                self.http_port
            ));
        }
        warnings
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let path = path.to_path_buf();
    let content = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::ReadFile { path: path.clone(), source: e })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson { path, source: e })
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{} has invalid value '{}'", name, value)))
}
