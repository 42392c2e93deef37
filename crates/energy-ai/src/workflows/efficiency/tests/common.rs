use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::ProviderKind;
use crate::workflows::efficiency::{
    BuildingProfile, BuildingType, EfficiencyAnalysisService, ExplanationComposer, Prompt,
    ProviderError, StaticTables, TextGenerator,
};

pub(super) fn hospital_profile() -> BuildingProfile {
    BuildingProfile::new(BuildingType::Hospital, 10_200.0, 720_893.0)
}

pub(super) fn office_profile(annual_kwh_per_sqm: f64) -> BuildingProfile {
    BuildingProfile::new(BuildingType::Office, 1_000.0, annual_kwh_per_sqm * 1_000.0)
        .with_occupancy(60)
}

pub(super) fn tables() -> StaticTables {
    StaticTables::builtin().expect("built-in tables load")
}

pub(super) fn service_with(composer: ExplanationComposer) -> EfficiencyAnalysisService {
    EfficiencyAnalysisService::new(tables(), 3, composer)
}

pub(super) fn template_service() -> EfficiencyAnalysisService {
    service_with(ExplanationComposer::template_only())
}

pub(super) fn composer_with(generator: impl TextGenerator + 'static) -> ExplanationComposer {
    let generator: Arc<dyn TextGenerator> = Arc::new(generator);
    ExplanationComposer::new(Some(generator), Duration::from_millis(200))
}

/// Returns a fixed completion and records every prompt it receives.
#[derive(Debug, Default, Clone)]
pub(super) struct ScriptedGenerator {
    pub(super) reply: String,
    pub(super) prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl ScriptedGenerator {
    pub(super) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Arc::default(),
        }
    }

    pub(super) fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.clone());
        Ok(self.reply.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct UnavailableGenerator;

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, ProviderError> {
        Err(ProviderError::unavailable(
            ProviderKind::OpenAi,
            "connection refused",
        ))
    }
}

/// Never answers within any reasonable timeout.
#[derive(Debug, Clone, Copy)]
pub(super) struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

/// Prefixes the translated text so tests can tell it apart.
#[derive(Debug, Clone, Copy)]
pub(super) struct PrefixTranslator;

#[async_trait]
impl TextGenerator for PrefixTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let text = prompt.user.trim_start_matches("TEXT:\n");
        Ok(format!("[tr] {text}"))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
