//! Report composition: prompt construction, one bounded provider call, template fallback
//! and optional translation.

mod prompt;
mod provider;
mod sections;
mod template;
mod translation;

pub use prompt::Prompt;
pub use provider::{
    build_generator, select_generator, AnthropicGenerator, OllamaGenerator, OpenAiGenerator,
    ProviderError, TextGenerator,
};
pub use translation::{TranslationError, Translator};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::dataset::SimilarRecord;
use super::domain::{BuildingProfile, EfficiencyVerdict, KpiSet};
use super::knowledge::RetrievalResult;
use super::whatif::WhatIfSimulation;
use crate::config::ProviderKind;

/// Everything the composer reads for one request.
#[derive(Debug, Clone, Copy)]
pub struct ComposerInput<'a> {
    pub profile: &'a BuildingProfile,
    pub kpis: &'a KpiSet,
    pub verdict: &'a EfficiencyVerdict,
    pub retrieval: &'a RetrievalResult<'a>,
    pub similar: &'a [SimilarRecord],
}

impl ComposerInput<'_> {
    pub(crate) fn source_ids(&self) -> Vec<String> {
        self.retrieval.document_ids()
    }
}

/// A simulated scenario with both sides classified, plus the scenario documents.
#[derive(Debug, Clone, Copy)]
pub struct WhatIfComposerInput<'a> {
    pub simulation: &'a WhatIfSimulation,
    pub baseline: &'a EfficiencyVerdict,
    pub whatif: &'a EfficiencyVerdict,
    pub retrieval: &'a RetrievalResult<'a>,
}

impl WhatIfComposerInput<'_> {
    pub(crate) fn source_ids(&self) -> Vec<String> {
        self.retrieval.document_ids()
    }

    pub(crate) fn heading(&self) -> String {
        format!(
            "What-if Scenario for {} Building: {}",
            self.simulation.building_type.label(),
            self.simulation.scenario.label()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub explanation: String,
    pub recommendations: String,
    pub sources: Vec<String>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.explanation.trim().is_empty() && self.recommendations.trim().is_empty()
    }
}

/// Why the template replaced generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    Unavailable { detail: String },
    Timeout { after_secs: u64 },
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Composition {
    Generated {
        report: Report,
        provider: ProviderKind,
    },
    Fallback {
        report: Report,
        reason: FallbackReason,
    },
}

impl Composition {
    pub fn report(&self) -> &Report {
        match self {
            Self::Generated { report, .. } | Self::Fallback { report, .. } => report,
        }
    }

    fn report_mut(&mut self) -> &mut Report {
        match self {
            Self::Generated { report, .. } | Self::Fallback { report, .. } => report,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Localization {
    NotConfigured,
    Translated { language: String },
    Failed { language: String, reason: String },
}

/// Steps the composer passed through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerStage {
    NotStarted,
    PromptBuilt,
    ProviderAttempted,
    ProviderSucceeded,
    ProviderFailed,
    TemplateUsed,
    TranslationAttempted,
    Translated,
    TranslationFailed,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationOutcome {
    pub composition: Composition,
    pub localization: Localization,
    pub stages: Vec<ComposerStage>,
    pub provider_used: bool,
}

impl ExplanationOutcome {
    pub fn report(&self) -> &Report {
        self.composition.report()
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        match &self.composition {
            Composition::Generated { provider, .. } => Some(*provider),
            Composition::Fallback { .. } => None,
        }
    }
}

/// Turns computed results into prose, degrading to the template whenever the
/// provider cannot deliver.
#[derive(Clone)]
pub struct ExplanationComposer {
    generator: Option<Arc<dyn TextGenerator>>,
    translator: Option<Translator>,
    timeout: Duration,
}

impl std::fmt::Debug for ExplanationComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationComposer")
            .field("provider", &self.generator.as_ref().map(|generator| generator.kind()))
            .field("translator", &self.translator)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExplanationComposer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self {
            generator,
            translator: None,
            timeout,
        }
    }

    pub fn template_only() -> Self {
        Self::new(None, Duration::from_secs(60))
    }

    pub fn with_translator(mut self, translator: Option<Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.generator.as_ref().map(|generator| generator.kind())
    }

    pub async fn compose(&self, input: ComposerInput<'_>) -> ExplanationOutcome {
        let prompt = prompt::analysis_prompt(&input);
        debug!(prompt_chars = prompt.user.len(), "analysis prompt built");

        let heading = sections::analysis_heading(&input.verdict.building_type);
        self.explain(&prompt, &heading, input.source_ids(), || template::render(&input))
            .await
    }

    /// Same flow as [`compose`](Self::compose) for a what-if run: scenario prompt, what-if
    /// template on fallback, then the configured translation.
    pub async fn compose_whatif(&self, input: WhatIfComposerInput<'_>) -> ExplanationOutcome {
        let prompt = prompt::whatif_prompt(&input);
        debug!(
            prompt_chars = prompt.user.len(),
            scenario = input.simulation.scenario.as_str(),
            "what-if prompt built"
        );

        self.explain(&prompt, &input.heading(), input.source_ids(), || {
            template::render_whatif(&input)
        })
        .await
    }

    async fn explain(
        &self,
        prompt: &Prompt,
        heading: &str,
        sources: Vec<String>,
        template: impl FnOnce() -> Report,
    ) -> ExplanationOutcome {
        let mut stages = vec![ComposerStage::NotStarted, ComposerStage::PromptBuilt];

        let mut composition = match &self.generator {
            None => {
                stages.push(ComposerStage::TemplateUsed);
                Composition::Fallback {
                    report: template(),
                    reason: FallbackReason::NotConfigured,
                }
            }
            Some(generator) => {
                stages.push(ComposerStage::ProviderAttempted);
                match self.attempt(generator.as_ref(), prompt).await {
                    Ok(text) => {
                        stages.push(ComposerStage::ProviderSucceeded);
                        let (explanation, recommendations) =
                            sections::split_sections(&text, heading);
                        info!(provider = %generator.kind(), "report generated");
                        Composition::Generated {
                            report: Report {
                                explanation,
                                recommendations,
                                sources,
                            },
                            provider: generator.kind(),
                        }
                    }
                    Err(reason) => {
                        warn!(provider = %generator.kind(), reason = ?reason, "provider failed; using template");
                        stages.push(ComposerStage::ProviderFailed);
                        stages.push(ComposerStage::TemplateUsed);
                        Composition::Fallback {
                            report: template(),
                            reason,
                        }
                    }
                }
            }
        };

        let localization = match &self.translator {
            None => Localization::NotConfigured,
            Some(translator) => {
                stages.push(ComposerStage::TranslationAttempted);
                match translate_report(translator, composition.report()).await {
                    Ok(translated) => {
                        stages.push(ComposerStage::Translated);
                        *composition.report_mut() = translated;
                        Localization::Translated {
                            language: translator.language().to_string(),
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "translation failed; keeping original report");
                        stages.push(ComposerStage::TranslationFailed);
                        Localization::Failed {
                            language: translator.language().to_string(),
                            reason: err.to_string(),
                        }
                    }
                }
            }
        };

        stages.push(ComposerStage::Done);
        let provider_used = matches!(composition, Composition::Generated { .. });

        ExplanationOutcome {
            composition,
            localization,
            stages,
            provider_used,
        }
    }

    async fn attempt(
        &self,
        generator: &dyn TextGenerator,
        prompt: &Prompt,
    ) -> Result<String, FallbackReason> {
        match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Err(_) => Err(FallbackReason::Timeout {
                after_secs: self.timeout.as_secs(),
            }),
            Ok(Err(ProviderError::Timeout { after, .. })) => Err(FallbackReason::Timeout {
                after_secs: after.as_secs(),
            }),
            Ok(Err(err @ ProviderError::Unavailable { .. })) => Err(FallbackReason::Unavailable {
                detail: err.to_string(),
            }),
            Ok(Ok(text)) if text.trim().is_empty() => Err(FallbackReason::EmptyResponse),
            Ok(Ok(text)) => Ok(text),
        }
    }
}

async fn translate_report(translator: &Translator, report: &Report) -> Result<Report, TranslationError> {
    let explanation = translator.translate(&report.explanation).await?;
    let recommendations = translator.translate(&report.recommendations).await?;
    Ok(Report {
        explanation,
        recommendations,
        sources: report.sources.clone(),
    })
}
