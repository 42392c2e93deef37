use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use energy_ai::workflows::efficiency::{analysis_router, EfficiencyAnalysisService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_analysis_routes(service: Arc<EfficiencyAnalysisService>) -> axum::Router {
    analysis_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use energy_ai::workflows::efficiency::{ExplanationComposer, StaticTables};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let tables = StaticTables::builtin().expect("built-in tables");
        let service = EfficiencyAnalysisService::new(tables, 3, ExplanationComposer::template_only());
        with_analysis_routes(Arc::new(service)).layer(Extension(state))
    }

    async fn status_of(router: axum::Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router response")
            .status()
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let state = state(false);
        assert_eq!(
            status_of(app(state.clone()), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.readiness.store(true, Ordering::Release);
        assert_eq!(status_of(app(state), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn analysis_routes_are_mounted_next_to_operational_ones() {
        let state = state(true);
        assert_eq!(status_of(app(state.clone()), "/metrics").await, StatusCode::OK);
        assert_eq!(
            status_of(app(state.clone()), "/api/v1/benchmarks/hotel").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(app(state), "/api/v1/dataset/stats").await,
            StatusCode::OK
        );
    }
}
