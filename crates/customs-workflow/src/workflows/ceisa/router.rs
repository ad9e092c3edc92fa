use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::{CeisaError, CeisaProxy, CeisaRequest};

pub fn ceisa_router(proxy: Arc<CeisaProxy>) -> Router {
    Router::new()
        .route("/api/v1/ceisa", post(proxy_handler))
        .with_state(proxy)
}

pub(crate) async fn proxy_handler(
    State(proxy): State<Arc<CeisaProxy>>,
    Json(request): Json<CeisaRequest>,
) -> Response {
    match proxy.handle(request).await {
        Ok(response) => Json(response).into_response(),
        Err(err @ CeisaError::MissingEndpoint) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
        }
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
