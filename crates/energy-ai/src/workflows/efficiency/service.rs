use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dataset::{DatasetComparison, DatasetStats, ReferenceDataset, SimilarRecord};
use super::domain::{
    AnalysisError, BenchmarkBand, BuildingProfile, BuildingType, EfficiencyVerdict, KpiSet,
    TableLoadError,
};
use super::evaluation::{BenchmarkTable, EfficiencyEvaluator};
use super::knowledge::{KnowledgeBase, KnowledgeRetriever, RetrievalQuery, RetrievalResult};
use super::kpi::{ClimateTable, KpiCalculator};
use super::narrative::{
    ComposerInput, ExplanationComposer, ExplanationOutcome, WhatIfComposerInput,
};
use super::whatif::{WhatIfInputs, WhatIfSimulation, WhatIfSimulator};
use crate::config::TableConfig;

const SIMILAR_RECORD_LIMIT: usize = 5;

/// Read-only tables shared by every request.
#[derive(Debug, Clone)]
pub struct StaticTables {
    pub benchmarks: Arc<BenchmarkTable>,
    pub climate: ClimateTable,
    pub knowledge: Arc<KnowledgeBase>,
    pub dataset: Arc<ReferenceDataset>,
}

impl StaticTables {
    pub fn builtin() -> Result<Self, TableLoadError> {
        Ok(Self {
            benchmarks: Arc::new(BenchmarkTable::standard()),
            climate: ClimateTable::standard(),
            knowledge: Arc::new(KnowledgeBase::builtin()?),
            dataset: Arc::new(ReferenceDataset::builtin()?),
        })
    }

    /// Loads configured files, using the built-in copy for anything not configured.
    pub fn load(config: &TableConfig) -> Result<Self, TableLoadError> {
        let benchmarks = match &config.benchmarks_path {
            Some(path) => BenchmarkTable::from_path(path)?,
            None => BenchmarkTable::standard(),
        };
        let knowledge = match &config.knowledge_base_path {
            Some(path) => KnowledgeBase::load(path)?,
            None => KnowledgeBase::builtin()?,
        };
        let dataset = match &config.reference_dataset_path {
            Some(path) => ReferenceDataset::from_path(path)?,
            None => ReferenceDataset::builtin()?,
        };

        info!(
            benchmark_types = benchmarks.len(),
            knowledge_documents = knowledge.len(),
            reference_records = dataset.len(),
            "static tables loaded"
        );

        Ok(Self {
            benchmarks: Arc::new(benchmarks),
            climate: ClimateTable::standard(),
            knowledge: Arc::new(knowledge),
            dataset: Arc::new(dataset),
        })
    }
}

/// Analysis request: the building profile plus an optional topic steering retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(flatten)]
    pub profile: BuildingProfile,
    #[serde(default)]
    pub topic: Option<String>,
}

impl From<BuildingProfile> for AnalysisRequest {
    fn from(profile: BuildingProfile) -> Self {
        Self {
            profile,
            topic: None,
        }
    }
}

/// Retrieved document as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReference {
    pub id: String,
    pub title: String,
    pub source: String,
    pub relevance: usize,
}

impl SourceReference {
    fn collect(result: &RetrievalResult<'_>) -> Vec<Self> {
        result
            .matches
            .iter()
            .map(|matched| Self {
                id: matched.document.id.clone(),
                title: matched.document.title.clone(),
                source: matched.document.source.clone(),
                relevance: matched.relevance,
            })
            .collect()
    }
}

/// Deterministic part of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub kpis: KpiSet,
    pub verdict: EfficiencyVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub building: BuildingProfile,
    pub kpis: KpiSet,
    pub verdict: EfficiencyVerdict,
    pub sources: Vec<SourceReference>,
    pub similar_buildings: Vec<SimilarRecord>,
    pub narrative: ExplanationOutcome,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfReport {
    pub simulation: WhatIfSimulation,
    pub baseline: Assessment,
    pub whatif: Assessment,
    pub sources: Vec<SourceReference>,
    pub narrative: ExplanationOutcome,
    pub generated_at: DateTime<Utc>,
}

/// Service composing the KPI calculator, evaluator, retriever and composer.
#[derive(Debug, Clone)]
pub struct EfficiencyAnalysisService {
    calculator: KpiCalculator,
    evaluator: EfficiencyEvaluator,
    retriever: KnowledgeRetriever,
    dataset: Arc<ReferenceDataset>,
    composer: ExplanationComposer,
    simulator: WhatIfSimulator,
}

impl EfficiencyAnalysisService {
    pub fn new(tables: StaticTables, retrieval_limit: usize, composer: ExplanationComposer) -> Self {
        Self {
            calculator: KpiCalculator::new(tables.climate),
            evaluator: EfficiencyEvaluator::new(tables.benchmarks),
            retriever: KnowledgeRetriever::with_limit(tables.knowledge, retrieval_limit),
            dataset: tables.dataset,
            composer,
            simulator: WhatIfSimulator,
        }
    }

    pub fn composer(&self) -> &ExplanationComposer {
        &self.composer
    }

    pub fn benchmark_table(&self) -> &BenchmarkTable {
        self.evaluator.table()
    }

    pub fn benchmarks(&self, building_type: &BuildingType) -> Result<BenchmarkBand, AnalysisError> {
        self.evaluator.benchmarks(building_type)
    }

    /// KPIs and verdict without retrieval or prose.
    pub fn assess(&self, profile: &BuildingProfile) -> Result<Assessment, AnalysisError> {
        let kpis = self.calculator.calculate(profile)?;
        let verdict = self.evaluator.evaluate(&kpis, &profile.building_type)?;
        Ok(Assessment { kpis, verdict })
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let AnalysisRequest { profile, topic } = request;
        let Assessment { kpis, verdict } = self.assess(&profile)?;

        let query = RetrievalQuery::new(&profile.building_type, verdict.label)
            .with_topic(topic.as_deref());
        let retrieval = self.retriever.retrieve(&query);
        let similar = self.dataset.similar(
            &profile.building_type,
            verdict.annual_energy_per_sqm_kwh,
            SIMILAR_RECORD_LIMIT,
        );
        debug!(
            label = verdict.label.as_str(),
            documents = retrieval.len(),
            similar = similar.len(),
            "analysis context assembled"
        );

        let narrative = self
            .composer
            .compose(ComposerInput {
                profile: &profile,
                kpis: &kpis,
                verdict: &verdict,
                retrieval: &retrieval,
                similar: &similar,
            })
            .await;

        info!(
            building_type = %profile.building_type,
            label = verdict.label.as_str(),
            provider_used = narrative.provider_used,
            "analysis completed"
        );

        Ok(AnalysisReport {
            sources: SourceReference::collect(&retrieval),
            building: profile,
            kpis,
            verdict,
            similar_buildings: similar,
            narrative,
            generated_at: Utc::now(),
        })
    }

    /// Runs a what-if scenario, re-evaluates both sides against the benchmarks and explains
    /// the result.
    pub async fn whatif(&self, inputs: WhatIfInputs) -> Result<WhatIfReport, AnalysisError> {
        let simulation = self.simulator.simulate(&inputs)?;

        let mut profile = BuildingProfile::new(
            inputs.building_type.clone(),
            inputs.building_area_m2,
            inputs.total_energy_kwh,
        )
        .with_period_months(inputs.period_months);
        profile.occupancy = inputs.occupancy;
        let baseline = self.assess(&profile)?;

        profile.total_energy_kwh = simulation.whatif.total_kwh;
        profile.occupancy = simulation
            .whatif_occupancy
            .map(|people| people as i64)
            .or(inputs.occupancy);
        let whatif = self.assess(&profile)?;

        let query = RetrievalQuery::new(&inputs.building_type, whatif.verdict.label)
            .with_topic(Some(inputs.scenario.topic()));
        let retrieval = self.retriever.retrieve(&query);

        let narrative = self
            .composer
            .compose_whatif(WhatIfComposerInput {
                simulation: &simulation,
                baseline: &baseline.verdict,
                whatif: &whatif.verdict,
                retrieval: &retrieval,
            })
            .await;

        info!(
            building_type = %inputs.building_type,
            scenario = inputs.scenario.as_str(),
            savings_percent = simulation.delta.savings_percent,
            provider_used = narrative.provider_used,
            "what-if completed"
        );

        Ok(WhatIfReport {
            sources: SourceReference::collect(&retrieval),
            simulation,
            baseline,
            whatif,
            narrative,
            generated_at: Utc::now(),
        })
    }

    pub fn dataset_stats(&self) -> DatasetStats {
        self.dataset.stats()
    }

    pub fn dataset_compare(
        &self,
        total_energy_kwh: f64,
        building_area_m2: f64,
        building_type: Option<&BuildingType>,
    ) -> Result<DatasetComparison, AnalysisError> {
        self.dataset
            .compare(total_energy_kwh, building_area_m2, building_type)
    }
}
