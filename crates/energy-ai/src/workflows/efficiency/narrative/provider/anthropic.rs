use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, ProviderError, TextGenerator};
use crate::config::ProviderKind;
use crate::workflows::efficiency::narrative::prompt::Prompt;

const PROVIDER: ProviderKind = ProviderKind::Anthropic;
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Hosted messages-API backend.
#[derive(Clone)]
pub struct AnthropicGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicGenerator {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1500,
            "system": prompt.system,
            "messages": [{"role": "user", "content": prompt.user}],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| ProviderError::from_http(PROVIDER, self.timeout, err))?;

        let payload: MessagesResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::from_http(PROVIDER, self.timeout, err))?;

        let text: String = payload
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            Err(ProviderError::unavailable(PROVIDER, "response contained no text"))
        } else {
            Ok(text)
        }
    }
}
