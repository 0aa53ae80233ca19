use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use project_tracker::tracker::{tracker_router, TrackerService, TrackerStore};

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: &'static str,
}

pub(crate) fn with_tracker_routes<S>(service: Arc<TrackerService<S>>) -> axum::Router
where
    S: TrackerStore + 'static,
{
    tracker_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
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
    use crate::infra::{demo_org, seed_demo_data};
    use axum::body::Body;
    use axum::http::Request;
    use project_tracker::tracker::MemoryTrackerStore;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn seeded_statistics_are_served_over_http() {
        let store = Arc::new(MemoryTrackerStore::default());
        let service = Arc::new(TrackerService::new(store));
        let org = demo_org();
        seed_demo_data(&service, &org).expect("demo data seeds");

        let router = with_tracker_routes(service);
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/v1/orgs/{}/statistics", org.0))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["total_students"].as_u64(), Some(5));
        assert_eq!(payload["total_teams"].as_u64(), Some(2));
        assert_eq!(payload["completed_teams"].as_u64(), Some(1));
    }
}
