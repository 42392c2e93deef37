use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, ProviderError, TextGenerator};
use crate::config::{OllamaSettings, ProviderKind};
use crate::workflows::efficiency::narrative::prompt::Prompt;

const PROVIDER: ProviderKind = ProviderKind::Ollama;

/// Local model served by Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
    num_predict: u32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaGenerator {
    pub fn new(settings: &OllamaSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: 0.7,
            num_predict: 1500,
            timeout,
        })
    }

    /// Deterministic settings for the translation pass.
    pub fn for_translation(settings: &OllamaSettings, timeout: Duration) -> Result<Self, ProviderError> {
        let mut generator = Self::new(settings, timeout)?;
        generator.temperature = 0.0;
        generator.num_predict = 1800;
        Ok(generator)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt.combined(),
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.num_predict,
            },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| ProviderError::from_http(PROVIDER, self.timeout, err))?;

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::from_http(PROVIDER, self.timeout, err))?;

        Ok(payload.response)
    }
}

/// True when an Ollama server answers `/api/tags` within `timeout`.
pub(super) async fn probe(base_url: &str, timeout: Duration) -> bool {
    let Ok(client) = http_client(PROVIDER, timeout) else {
        return false;
    };

    client
        .get(format!("{}/api/tags", base_url.trim_end_matches('/')))
        .send()
        .await
        .map(|response| response.status().is_success())
        .unwrap_or(false)
}
