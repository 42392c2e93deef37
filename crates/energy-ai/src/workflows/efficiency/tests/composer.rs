use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::config::{OllamaSettings, ProviderKind};
use crate::workflows::efficiency::narrative::OllamaGenerator;
use crate::workflows::efficiency::{
    AnalysisRequest, BuildingType, ComposerStage, Composition, ExplanationComposer,
    FallbackReason, Localization, Scenario, TextGenerator, Translator, WhatIfInputs,
};

fn led_office() -> WhatIfInputs {
    WhatIfInputs::new(BuildingType::Office, 1_000.0, 120_000.0, Scenario::Led).with_occupancy(60)
}

#[tokio::test]
async fn template_report_is_used_without_a_provider() {
    let report = template_service()
        .analyze(hospital_profile().into())
        .await
        .expect("hospital analysis");
    let outcome = report.narrative;

    assert!(!outcome.provider_used);
    assert_eq!(outcome.provider(), None);
    assert!(matches!(
        outcome.composition,
        Composition::Fallback {
            reason: FallbackReason::NotConfigured,
            ..
        }
    ));
    assert_eq!(
        outcome.stages,
        vec![
            ComposerStage::NotStarted,
            ComposerStage::PromptBuilt,
            ComposerStage::TemplateUsed,
            ComposerStage::Done,
        ]
    );

    let text = outcome.report();
    assert!(text
        .explanation
        .starts_with("## Energy Efficiency Analysis for Hospital Building"));
    assert!(text.explanation.contains("70.7 kWh/m²/year"));
    assert!(text.recommendations.starts_with("## Recommended Actions"));
    let ids: Vec<&str> = report.sources.iter().map(|source| source.id.as_str()).collect();
    assert_eq!(text.sources, ids);
}

#[tokio::test]
async fn template_for_a_threshold_value_reports_the_efficient_band() {
    let report = template_service()
        .analyze(office_profile(100.0).into())
        .await
        .expect("office analysis");
    let explanation = &report.narrative.report().explanation;

    assert!(explanation.contains("classified as **efficient**"));
    assert!(explanation.contains("performance is excellent"));
    assert!(!explanation.contains("by about 0.0%"));
}

#[tokio::test]
async fn unreachable_local_provider_falls_back_to_the_template() {
    let settings = OllamaSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        model: "llama3".to_string(),
    };
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OllamaGenerator::new(&settings, Duration::from_secs(2)).expect("client builds"));
    let service = service_with(ExplanationComposer::new(
        Some(generator),
        Duration::from_secs(5),
    ));

    let report = service
        .analyze(hospital_profile().into())
        .await
        .expect("analysis succeeds without the provider");
    let outcome = report.narrative;

    assert!(!outcome.provider_used);
    assert!(!outcome.report().is_empty());
    assert!(matches!(
        outcome.composition,
        Composition::Fallback {
            reason: FallbackReason::Unavailable { .. } | FallbackReason::Timeout { .. },
            ..
        }
    ));
    assert_eq!(
        &outcome.stages[2..],
        &[
            ComposerStage::ProviderAttempted,
            ComposerStage::ProviderFailed,
            ComposerStage::TemplateUsed,
            ComposerStage::Done,
        ]
    );
}

#[tokio::test]
async fn provider_error_is_recorded_as_the_fallback_reason() {
    let service = service_with(composer_with(UnavailableGenerator));

    let outcome = service
        .analyze(office_profile(180.0).into())
        .await
        .expect("office analysis")
        .narrative;

    match outcome.composition {
        Composition::Fallback {
            reason: FallbackReason::Unavailable { detail },
            report,
        } => {
            assert!(detail.contains("connection refused"));
            assert!(report.explanation.contains("inefficient"));
        }
        other => panic!("expected unavailable fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_is_cut_off_by_the_timeout() {
    let service = service_with(composer_with(HangingGenerator));

    let outcome = service
        .analyze(hospital_profile().into())
        .await
        .expect("hospital analysis")
        .narrative;

    assert!(!outcome.provider_used);
    assert!(matches!(
        outcome.composition,
        Composition::Fallback {
            reason: FallbackReason::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn blank_completion_counts_as_a_failure() {
    let service = service_with(composer_with(ScriptedGenerator::replying("   \n ")));

    let outcome = service
        .analyze(hospital_profile().into())
        .await
        .expect("hospital analysis")
        .narrative;

    assert!(matches!(
        outcome.composition,
        Composition::Fallback {
            reason: FallbackReason::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn generated_text_is_split_into_sections() {
    let generator = ScriptedGenerator::replying(
        "## Explanation\nThe hospital performs well.\n\n## Recommendations\n- Keep metering.",
    );
    let service = service_with(composer_with(generator.clone()));

    let outcome = service
        .analyze(AnalysisRequest {
            profile: hospital_profile(),
            topic: Some("monitoring".to_string()),
        })
        .await
        .expect("hospital analysis")
        .narrative;

    assert!(outcome.provider_used);
    assert_eq!(outcome.provider(), Some(ProviderKind::Ollama));
    assert_eq!(
        outcome.report().explanation,
        "## Energy Efficiency Analysis for Hospital Building\n\nThe hospital performs well."
    );
    assert_eq!(
        outcome.report().recommendations,
        "## Recommended Actions\n\n- Keep metering."
    );
    assert!(outcome.stages.contains(&ComposerStage::ProviderSucceeded));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("- Building type: Hospital"));
    assert!(prompts[0].user.contains("RELEVANT TECHNICAL DOCUMENTS"));
    assert!(prompts[0].user.contains("REFERENCE DATASET"));
}

#[tokio::test]
async fn translation_replaces_both_sections() {
    let translator = Translator::new(
        Arc::new(PrefixTranslator),
        "Turkish",
        1_800,
        Duration::from_secs(1),
    );
    let composer = ExplanationComposer::template_only().with_translator(Some(translator));
    let service = service_with(composer);

    let outcome = service
        .analyze(hospital_profile().into())
        .await
        .expect("hospital analysis")
        .narrative;

    assert_eq!(
        outcome.localization,
        Localization::Translated {
            language: "Turkish".to_string()
        }
    );
    assert!(outcome.report().explanation.starts_with("[tr] ## Energy Efficiency"));
    assert!(outcome.report().recommendations.starts_with("[tr] ## Recommended Actions"));
    assert_eq!(
        &outcome.stages[3..],
        &[
            ComposerStage::TranslationAttempted,
            ComposerStage::Translated,
            ComposerStage::Done,
        ]
    );
}

#[tokio::test]
async fn failed_translation_keeps_the_original_report() {
    let translator = Translator::new(
        Arc::new(UnavailableGenerator),
        "German",
        1_800,
        Duration::from_secs(1),
    );
    let composer = ExplanationComposer::template_only().with_translator(Some(translator));
    let service = service_with(composer);

    let outcome = service
        .analyze(hospital_profile().into())
        .await
        .expect("hospital analysis")
        .narrative;

    assert!(matches!(
        &outcome.localization,
        Localization::Failed { language, .. } if language == "German"
    ));
    assert!(outcome
        .report()
        .explanation
        .starts_with("## Energy Efficiency Analysis for Hospital Building"));
    assert!(outcome.stages.contains(&ComposerStage::TranslationFailed));
    assert_eq!(outcome.stages.last(), Some(&ComposerStage::Done));
}

#[tokio::test]
async fn whatif_generation_uses_the_scenario_prompt() {
    let generator = ScriptedGenerator::replying(
        "### Explanation\nLighting savings are modest.\n\n### Recommendations\n1. If you choose LED only then savings stay near 12%.",
    );
    let service = service_with(composer_with(generator.clone()));

    let outcome = service
        .whatif(led_office())
        .await
        .expect("led scenario")
        .narrative;

    assert!(outcome.provider_used);
    assert_eq!(
        outcome.report().explanation,
        "## What-if Scenario for Office Building: LED lighting retrofit\n\nLighting savings are modest."
    );
    assert_eq!(
        outcome.report().recommendations,
        "## Recommended Actions\n\n1. If you choose LED only then savings stay near 12%."
    );

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].system.contains("what-if"));
    assert!(prompts[0]
        .user
        .starts_with("WHAT-IF SCENARIO: led (LED lighting retrofit)"));
    assert!(prompts[0].user.contains("BASELINE:"));
    assert!(prompts[0].user.contains("SOLUTION OPTIONS"));
    assert!(prompts[0].user.contains("- Option 3: LED, sensors and automated shutdown schedules"));
}

#[tokio::test]
async fn whatif_falls_back_to_the_scenario_template() {
    let service = service_with(composer_with(UnavailableGenerator));

    let report = service.whatif(led_office()).await.expect("led scenario");
    let outcome = &report.narrative;

    assert!(!outcome.provider_used);
    assert!(matches!(
        outcome.composition,
        Composition::Fallback {
            reason: FallbackReason::Unavailable { .. },
            ..
        }
    ));
    assert_eq!(
        &outcome.stages[2..],
        &[
            ComposerStage::ProviderAttempted,
            ComposerStage::ProviderFailed,
            ComposerStage::TemplateUsed,
            ComposerStage::Done,
        ]
    );

    let text = outcome.report();
    assert!(text
        .explanation
        .starts_with("## What-if Scenario for Office Building: LED lighting retrofit"));
    assert!(text.explanation.contains(&format!(
        "cuts consumption by about {:.1}%",
        report.simulation.delta.savings_percent
    )));
    assert!(text.recommendations.starts_with("## Solution Options"));
    assert!(text
        .recommendations
        .contains("1. If you choose **LED retrofit only**"));
}

#[tokio::test]
async fn whatif_report_is_translated_like_the_analysis() {
    let translator = Translator::new(
        Arc::new(PrefixTranslator),
        "Turkish",
        1_800,
        Duration::from_secs(1),
    );
    let composer = ExplanationComposer::template_only().with_translator(Some(translator));

    let outcome = service_with(composer)
        .whatif(led_office())
        .await
        .expect("led scenario")
        .narrative;

    assert!(matches!(outcome.localization, Localization::Translated { .. }));
    assert!(outcome.report().explanation.starts_with("[tr] ## What-if Scenario"));
    assert!(outcome.report().recommendations.starts_with("[tr] ## Solution Options"));
}
