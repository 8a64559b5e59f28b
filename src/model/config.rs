use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const ENV_CONFIG_PATH: &str = "CWI_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub const ENV_GENERATION_API_KEY: &str = "CWI_GENERATION_API_KEY";
pub const ENV_EMBEDDING_API_KEY: &str = "CWI_EMBEDDING_API_KEY";
/// Legacy name kept for parity with existing deployments.
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Which upstream LLM wire format to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Generation/embedding provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Override the provider base URL (e.g. an OpenAI-compatible proxy).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            base_url: None,
        }
    }
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

/// Timeouts and throttles
#[derive(Debug, Clone, Deserialize)]
pub struct LimitConfig {
    /// Minimum elapsed time between analysis requests from one session.
    /// Bounds spend against the metered generation API.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Request timeout for the embedding call. The generation call streams
    /// and is bounded by the inactivity timeout instead.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// A generation stream with no traffic for this long is abandoned.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

impl LimitConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

fn default_rate_limit_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_stream_idle_timeout_secs() -> u64 {
    60
}

/// Retrieval strategy selection
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// When false the analyzer runs with the null retriever and every
    /// analysis is statute-only.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub limits: LimitConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub limits: LimitConfig,
    pub retrieval: RetrievalConfig,
    pub generation_api_key: Option<String>,
    pub embedding_api_key: Option<String>,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            limits: LimitConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation_api_key: None,
            embedding_api_key: None,
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let generation_api_key = std::env::var(ENV_GENERATION_API_KEY)
            .or_else(|_| std::env::var(ENV_GEMINI_API_KEY))
            .ok();
        let embedding_api_key = std::env::var(ENV_EMBEDDING_API_KEY).ok();

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            provider: file.provider,
            limits: file.limits,
            retrieval: file.retrieval,
            generation_api_key,
            embedding_api_key,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
