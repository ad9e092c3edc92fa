use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use customs_workflow::workflows::ceisa::{ceisa_router, CeisaProxy};
use customs_workflow::workflows::declaration::{
    declaration_router, notification_router, AuditStore, DeclarationService, DeclarationStore,
    HistoryStore, NotificationFeed, NotificationPublisher,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_customs_routes<S, N>(
    service: Arc<DeclarationService<S, N>>,
    feed: NotificationFeed,
    proxy: Arc<CeisaProxy>,
) -> axum::Router
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    declaration_router(service)
        .merge(notification_router(feed))
        .merge(ceisa_router(proxy))
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
        json!({ "status": "ready", "ceisa": state.ceisa_mode })
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
    use customs_workflow::workflows::declaration::InMemoryStore;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let feed = NotificationFeed::default();
        let service = Arc::new(DeclarationService::new(
            Arc::new(InMemoryStore::default()),
            Arc::new(feed.clone()),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            ceisa_mode: "mock",
        };
        with_customs_routes(service, feed, Arc::new(CeisaProxy::mock_only()))
            .layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let (status, payload) = get(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], json!("initializing"));

        let (status, payload) = get(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["ceisa"], json!("mock"));
    }

    #[tokio::test]
    async fn merged_router_serves_workflow_endpoints() {
        let (status, payload) = get(app(true), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], json!("ok"));

        let (status, payload) = get(app(true), "/api/v1/declarations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!([]));

        let (status, payload) = get(app(true), "/api/v1/notifications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["unread"], json!(0));
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text() {
        let response = app(true)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
