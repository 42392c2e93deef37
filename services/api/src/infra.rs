use energy_ai::config::AppConfig;
use energy_ai::error::AppError;
use energy_ai::workflows::efficiency::{
    select_generator, EfficiencyAnalysisService, ExplanationComposer, StaticTables, Translator,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the static tables and resolves the provider once; both are fixed for the
/// lifetime of the returned service.
pub(crate) async fn build_service(
    config: &AppConfig,
    use_provider: bool,
) -> Result<EfficiencyAnalysisService, AppError> {
    let tables = StaticTables::load(&config.tables)?;
    let composer = build_composer(config, use_provider).await;
    Ok(EfficiencyAnalysisService::new(
        tables,
        config.tables.retrieval_limit,
        composer,
    ))
}

async fn build_composer(config: &AppConfig, use_provider: bool) -> ExplanationComposer {
    if !use_provider {
        return ExplanationComposer::template_only();
    }

    let generator = select_generator(&config.llm).await;
    let translator = config.translation.as_ref().and_then(|translation| {
        match Translator::from_config(translation, config.llm.timeout) {
            Ok(translator) => Some(translator),
            Err(err) => {
                warn!(error = %err, language = %translation.language, "translation disabled");
                None
            }
        }
    });

    ExplanationComposer::new(generator, config.llm.timeout).with_translator(translator)
}
