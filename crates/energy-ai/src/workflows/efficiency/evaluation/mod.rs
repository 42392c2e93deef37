mod benchmarks;
mod rules;

pub use benchmarks::BenchmarkTable;

use std::sync::Arc;

use super::domain::{AnalysisError, BenchmarkBand, BuildingType, EfficiencyVerdict, KpiSet};
use rules::{place, potential_savings_percent};

/// Stateless evaluator classifying KPIs against the shared benchmark table.
#[derive(Debug, Clone)]
pub struct EfficiencyEvaluator {
    table: Arc<BenchmarkTable>,
}

impl EfficiencyEvaluator {
    pub fn new(table: Arc<BenchmarkTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BenchmarkTable {
        &self.table
    }

    pub fn benchmarks(&self, building_type: &BuildingType) -> Result<BenchmarkBand, AnalysisError> {
        self.table
            .get(building_type)
            .copied()
            .ok_or_else(|| AnalysisError::UnknownBuildingType(building_type.clone()))
    }

    pub fn evaluate(
        &self,
        kpis: &KpiSet,
        building_type: &BuildingType,
    ) -> Result<EfficiencyVerdict, AnalysisError> {
        let band = self.benchmarks(building_type)?;
        let annual = kpis.annual_energy_per_sqm_kwh;
        let placement = place(annual, &band);

        Ok(EfficiencyVerdict {
            building_type: building_type.clone(),
            label: placement.label,
            rating: placement.label.rating(),
            score: placement.score,
            annual_energy_per_sqm_kwh: annual,
            matched_range: placement.range,
            benchmarks: band,
            potential_savings_percent: potential_savings_percent(annual, placement.label, &band),
        })
    }
}

impl Default for EfficiencyEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(BenchmarkTable::standard()))
    }
}
