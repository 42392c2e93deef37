//! Building energy-efficiency analysis: KPI normalization, benchmark classification,
//! knowledge retrieval and report composition.

pub mod dataset;
pub mod domain;
pub(crate) mod evaluation;
pub mod knowledge;
pub mod kpi;
pub mod narrative;
pub mod router;
pub mod service;
pub mod whatif;

#[cfg(test)]
mod tests;

pub use dataset::{DatasetComparison, DatasetStats, ReferenceDataset, ReferenceRecord, SimilarRecord};
pub use domain::{
    AnalysisError, BandRange, BenchmarkBand, BuildingProfile, BuildingType, EfficiencyLabel,
    EfficiencyVerdict, KpiSet, TableLoadError,
};
pub use evaluation::{BenchmarkTable, EfficiencyEvaluator};
pub use knowledge::{
    KnowledgeBase, KnowledgeDocument, KnowledgeRetriever, RetrievalQuery, RetrievalResult,
};
pub use kpi::{ClimateTable, KpiCalculator};
pub use narrative::{
    select_generator, Composition, ComposerStage, ExplanationComposer, ExplanationOutcome,
    FallbackReason, Localization, Prompt, ProviderError, Report, TextGenerator, Translator,
    WhatIfComposerInput,
};
pub use router::analysis_router;
pub use service::{
    AnalysisReport, AnalysisRequest, Assessment, EfficiencyAnalysisService, SourceReference,
    StaticTables, WhatIfReport,
};
pub use whatif::{Scenario, WhatIfInputs, WhatIfSimulation, WhatIfSimulator};
