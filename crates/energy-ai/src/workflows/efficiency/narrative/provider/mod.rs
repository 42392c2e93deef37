mod anthropic;
mod ollama;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::prompt::Prompt;
use crate::config::{LlmConfig, ProviderKind, ProviderPreference};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Text-generation backend used by the composer and the translation stage.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} provider unavailable: {reason}")]
    Unavailable {
        provider: ProviderKind,
        reason: String,
    },
    #[error("{provider} provider timed out after {after:?}")]
    Timeout {
        provider: ProviderKind,
        after: Duration,
    },
}

impl ProviderError {
    pub fn unavailable(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            provider,
            reason: reason.into(),
        }
    }

    pub(crate) fn from_http(provider: ProviderKind, after: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { provider, after }
        } else {
            Self::unavailable(provider, err.to_string())
        }
    }
}

pub(crate) fn http_client(
    provider: ProviderKind,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::unavailable(provider, err.to_string()))
}

/// Resolves the configured preference into a concrete generator, or `None` for
/// template-only operation.
pub async fn select_generator(config: &LlmConfig) -> Option<Arc<dyn TextGenerator>> {
    let provider = match config.preference {
        ProviderPreference::Disabled => {
            info!("text generation disabled; reports use the template");
            return None;
        }
        ProviderPreference::Fixed(provider) => provider,
        ProviderPreference::Auto => match detect_provider(config).await {
            Some(provider) => provider,
            None => {
                info!("no text-generation provider detected; reports use the template");
                return None;
            }
        },
    };

    match build_generator(provider, config) {
        Ok(generator) => {
            info!(provider = %provider, "text-generation provider selected");
            Some(generator)
        }
        Err(err) => {
            warn!(provider = %provider, error = %err, "provider could not be initialised");
            None
        }
    }
}

pub fn build_generator(
    provider: ProviderKind,
    config: &LlmConfig,
) -> Result<Arc<dyn TextGenerator>, ProviderError> {
    let generator: Arc<dyn TextGenerator> = match provider {
        ProviderKind::Ollama => Arc::new(OllamaGenerator::new(&config.ollama, config.timeout)?),
        ProviderKind::OpenAi => {
            let api_key = config
                .openai
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::unavailable(provider, "OPENAI_API_KEY not set"))?;
            Arc::new(OpenAiGenerator::new(api_key, &config.openai.model, config.timeout)?)
        }
        ProviderKind::Anthropic => {
            let api_key = config.anthropic.api_key.clone().ok_or_else(|| {
                ProviderError::unavailable(provider, "ANTHROPIC_API_KEY not set")
            })?;
            Arc::new(AnthropicGenerator::new(
                api_key,
                &config.anthropic.model,
                config.timeout,
            )?)
        }
    };
    Ok(generator)
}

async fn detect_provider(config: &LlmConfig) -> Option<ProviderKind> {
    if ollama::probe(&config.ollama.base_url, PROBE_TIMEOUT).await {
        return Some(ProviderKind::Ollama);
    }
    if config.openai.api_key.is_some() {
        return Some(ProviderKind::OpenAi);
    }
    if config.anthropic.api_key.is_some() {
        return Some(ProviderKind::Anthropic);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> LlmConfig {
        let mut config = LlmConfig::template_only();
        config.preference = ProviderPreference::Auto;
        config.ollama.base_url = "http://127.0.0.1:9".to_string();
        config
    }

    #[tokio::test]
    async fn disabled_preference_selects_nothing() {
        assert!(select_generator(&LlmConfig::template_only()).await.is_none());
    }

    #[tokio::test]
    async fn auto_without_ollama_or_keys_selects_nothing() {
        assert!(select_generator(&unreachable_config()).await.is_none());
    }

    #[tokio::test]
    async fn auto_falls_through_to_hosted_key() {
        let mut config = unreachable_config();
        config.anthropic.api_key = Some("sk-ant-test".to_string());

        let generator = select_generator(&config).await.expect("anthropic selected");
        assert_eq!(generator.kind(), ProviderKind::Anthropic);
    }

    #[test]
    fn hosted_generator_requires_key() {
        let config = LlmConfig::template_only();
        let err = build_generator(ProviderKind::OpenAi, &config)
            .err()
            .expect("missing key rejected");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn refused_connection_is_reported_as_unavailable() {
        let generator = OpenAiGenerator::new("sk-test".to_string(), "gpt-4o-mini", Duration::from_secs(2))
            .expect("client builds")
            .with_base_url("http://127.0.0.1:9/");

        let err = generator
            .generate(&Prompt::new("system", "user"))
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(
            err,
            ProviderError::Unavailable {
                provider: ProviderKind::OpenAi,
                ..
            }
        ));
    }
}
