pub use crate::read::read_handler;

use crate::reader::HealthChecker;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/read", post(read_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Probes the store; 503 when it reports itself unusable.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::prompb::{Label, Query, ReadResponse, Sample, TimeSeries};
    use crate::reader::Querier;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    struct DownStore;

    #[async_trait]
    impl Querier for DownStore {
        async fn query(&self, _query: &Query) -> anyhow::Result<Vec<TimeSeries>> {
            Err(anyhow::anyhow!("store unreachable"))
        }
    }

    #[async_trait]
    impl HealthChecker for DownStore {
        async fn health_check(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store unreachable"))
        }
    }

    fn memory_app() -> Router {
        let store = MemoryStore::new(vec![TimeSeries {
            labels: vec![Label {
                name: "__name__".to_string(),
                value: "up".to_string(),
            }],
            samples: vec![Sample {
                value: 1.0,
                timestamp: 1500,
            }],
        }]);
        router(Arc::new(AppState::new(Arc::new(store), 1024)))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(resp.into_body())
            .await
            .expect("bytes");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_ok() {
        let response = memory_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn health_unavailable_carries_store_error() {
        let app = router(Arc::new(AppState::new(Arc::new(DownStore), 1024)));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let v = body_json(response).await;
        assert_eq!(v["status"], "unavailable");
        assert_eq!(v["error"], "store unreachable");
    }

    #[tokio::test]
    async fn read_route_serves_memory_store() {
        let payload = json!({
            "queries": [
                {
                    "start_timestamp_ms": 1000,
                    "end_timestamp_ms": 2000,
                    "matchers": [{ "type": "EQ", "name": "__name__", "value": "up" }]
                },
                {
                    "start_timestamp_ms": 1000,
                    "end_timestamp_ms": 2000,
                    "matchers": [{ "type": "EQ", "name": "__name__", "value": "down" }]
                }
            ]
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/read")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap();

        let response = memory_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let v: ReadResponse = serde_json::from_value(body_json(response).await).expect("response");
        assert_eq!(v.results.len(), 2);
        assert_eq!(v.results[0].timeseries.len(), 1);
        assert!(v.results[1].timeseries.is_empty());
    }

    #[tokio::test]
    async fn read_route_rejects_get() {
        let response = memory_app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/read")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
