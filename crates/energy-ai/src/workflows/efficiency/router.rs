use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::dataset::DatasetComparison;
use super::domain::BuildingType;
use super::service::{AnalysisReport, AnalysisRequest, EfficiencyAnalysisService, WhatIfReport};
use super::whatif::WhatIfInputs;
use crate::error::AppError;

/// Router exposing analysis, benchmark, what-if and dataset endpoints.
pub fn analysis_router(service: Arc<EfficiencyAnalysisService>) -> Router {
    Router::new()
        .route("/api/v1/analyze", post(analyze_handler))
        .route("/api/v1/benchmarks", get(benchmark_table_handler))
        .route("/api/v1/benchmarks/:building_type", get(benchmarks_handler))
        .route("/api/v1/whatif", post(whatif_handler))
        .route("/api/v1/dataset/stats", get(dataset_stats_handler))
        .route("/api/v1/dataset/validate", get(dataset_validate_handler))
        .with_state(service)
}

pub(crate) async fn analyze_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let report = service.analyze(request).await?;
    Ok(Json(report))
}

pub(crate) async fn benchmark_table_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
) -> Json<Value> {
    let table: serde_json::Map<String, Value> = service
        .benchmark_table()
        .iter()
        .map(|(building_type, band)| {
            (
                building_type.to_string(),
                json!({
                    "low": band.low,
                    "moderate": band.moderate,
                    "high": band.high,
                }),
            )
        })
        .collect();
    Json(json!({ "benchmarks": table }))
}

pub(crate) async fn benchmarks_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
    Path(building_type): Path<String>,
) -> Result<Json<Value>, AppError> {
    let building_type = BuildingType::parse(&building_type);
    let band = service.benchmarks(&building_type)?;
    Ok(Json(json!({
        "building_type": building_type,
        "benchmarks": band,
    })))
}

pub(crate) async fn whatif_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
    Json(inputs): Json<WhatIfInputs>,
) -> Result<Json<WhatIfReport>, AppError> {
    let report = service.whatif(inputs).await?;
    Ok(Json(report))
}

pub(crate) async fn dataset_stats_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
) -> Json<Value> {
    let stats = service.dataset_stats();
    Json(json!({
        "available": stats.count > 0,
        "records_loaded": stats.count,
        "stats": stats,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateQuery {
    total_energy_kwh: f64,
    building_area_m2: f64,
    #[serde(default)]
    building_type: Option<String>,
}

pub(crate) async fn dataset_validate_handler(
    State(service): State<Arc<EfficiencyAnalysisService>>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<DatasetComparison>, AppError> {
    let building_type = query.building_type.as_deref().map(BuildingType::parse);
    let comparison = service.dataset_compare(
        query.total_energy_kwh,
        query.building_area_m2,
        building_type.as_ref(),
    )?;
    Ok(Json(comparison))
}
