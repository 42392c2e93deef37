use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub llm: LlmConfig,
    pub translation: Option<TranslationConfig>,
    pub tables: TableConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = var("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("APP_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let llm = LlmConfig::from_env()?;
        let translation = TranslationConfig::from_env(&llm.ollama)?;
        let tables = TableConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            llm,
            translation,
            tables,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Text-generation backends the composer can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the provider is chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPreference {
    /// Probe the local Ollama first, then fall back to whichever hosted key is present.
    Auto,
    Fixed(ProviderKind),
    /// Template output only.
    Disabled,
}

impl FromStr for ProviderPreference {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "ollama" => Ok(Self::Fixed(ProviderKind::Ollama)),
            "openai" => Ok(Self::Fixed(ProviderKind::OpenAi)),
            "anthropic" => Ok(Self::Fixed(ProviderKind::Anthropic)),
            "template" | "none" | "disabled" => Ok(Self::Disabled),
            other => Err(ConfigError::InvalidProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

/// Credentials and model for a hosted API; the key never appears in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct HostedSettings {
    pub api_key: Option<String>,
    pub model: String,
}

impl fmt::Debug for HostedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

/// Provider selection resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub preference: ProviderPreference,
    pub timeout: Duration,
    pub ollama: OllamaSettings,
    pub openai: HostedSettings,
    pub anthropic: HostedSettings,
}

impl LlmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let preference = var("LLM_PROVIDER")
            .map(|raw| raw.parse::<ProviderPreference>())
            .transpose()?
            .unwrap_or(ProviderPreference::Auto);

        let timeout_secs: u64 = parse_var("LLM_TIMEOUT_SECS", 60)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "LLM_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let config = Self {
            preference,
            timeout: Duration::from_secs(timeout_secs),
            ollama: OllamaSettings {
                base_url: ollama_base_url("OLLAMA_BASE_URL"),
                model: var("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2".to_string()),
            },
            openai: HostedSettings {
                api_key: var("OPENAI_API_KEY"),
                model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            },
            anthropic: HostedSettings {
                api_key: var("ANTHROPIC_API_KEY"),
                model: var("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| "claude-3-haiku-20240307".to_string()),
            },
        };

        config.require_key_for_fixed_provider()?;
        Ok(config)
    }

    /// Generation disabled, default endpoints and no keys.
    pub fn template_only() -> Self {
        Self {
            preference: ProviderPreference::Disabled,
            timeout: Duration::from_secs(60),
            ollama: OllamaSettings {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
            },
            openai: HostedSettings {
                api_key: None,
                model: "gpt-4o-mini".to_string(),
            },
            anthropic: HostedSettings {
                api_key: None,
                model: "claude-3-haiku-20240307".to_string(),
            },
        }
    }

    fn require_key_for_fixed_provider(&self) -> Result<(), ConfigError> {
        let missing = match self.preference {
            ProviderPreference::Fixed(ProviderKind::OpenAi) => self.openai.api_key.is_none(),
            ProviderPreference::Fixed(ProviderKind::Anthropic) => {
                self.anthropic.api_key.is_none()
            }
            _ => false,
        };

        match self.preference {
            ProviderPreference::Fixed(provider) if missing => {
                Err(ConfigError::MissingApiKey { provider })
            }
            _ => Ok(()),
        }
    }
}

/// Second-pass translation through a local model; absent when `TRANSLATION_LANGUAGE` is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationConfig {
    pub language: String,
    pub ollama: OllamaSettings,
    pub max_chars: usize,
}

impl TranslationConfig {
    fn from_env(primary: &OllamaSettings) -> Result<Option<Self>, ConfigError> {
        let Some(language) = var("TRANSLATION_LANGUAGE") else {
            return Ok(None);
        };

        let max_chars: usize = parse_var("TRANSLATION_MAX_CHARS", 6000)?;
        if max_chars == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "TRANSLATION_MAX_CHARS",
                value: "0".to_string(),
            });
        }

        Ok(Some(Self {
            language,
            ollama: OllamaSettings {
                base_url: var("TRANSLATION_OLLAMA_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| primary.base_url.clone()),
                model: var("TRANSLATION_OLLAMA_MODEL").unwrap_or_else(|| primary.model.clone()),
            },
            max_chars,
        }))
    }
}

/// Locations of the static tables; `None` selects the built-in copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub knowledge_base_path: Option<PathBuf>,
    pub benchmarks_path: Option<PathBuf>,
    pub reference_dataset_path: Option<PathBuf>,
    pub retrieval_limit: usize,
}

impl TableConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let retrieval_limit: usize = parse_var("RETRIEVAL_LIMIT", 3)?;
        if retrieval_limit == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "RETRIEVAL_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            knowledge_base_path: var("KNOWLEDGE_BASE_PATH").map(PathBuf::from),
            benchmarks_path: var("BENCHMARKS_PATH").map(PathBuf::from),
            reference_dataset_path: var("REFERENCE_DATASET_PATH").map(PathBuf::from),
            retrieval_limit,
        })
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: None,
            benchmarks_path: None,
            reference_dataset_path: None,
            retrieval_limit: 3,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}

fn ollama_base_url(key: &str) -> String {
    var(key)
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:11434".to_string())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidProvider(String),
    InvalidNumber { key: &'static str, value: String },
    MissingApiKey { provider: ProviderKind },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidProvider(value) => write!(
                f,
                "LLM_PROVIDER must be one of auto, ollama, openai, anthropic, template (got '{value}')"
            ),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer (got '{value}')")
            }
            ConfigError::MissingApiKey { provider } => {
                let key = match provider {
                    ProviderKind::OpenAi => "OPENAI_API_KEY",
                    ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
                    ProviderKind::Ollama => "OLLAMA_BASE_URL",
                };
                write!(f, "LLM_PROVIDER={provider} requires {key} to be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
