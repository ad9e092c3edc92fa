use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use super::mock::mock_payload;
use super::upstream::{CeisaUpstream, ReqwestUpstream};
use super::{CeisaAction, CeisaError, CeisaRequest, CeisaResponse, CeisaSource};
use crate::config::CeisaConfig;

/// Forwards requests to CEISA when credentials are configured, otherwise serves mock data.
#[derive(Clone)]
pub struct CeisaProxy {
    upstream: Option<Arc<dyn CeisaUpstream>>,
}

impl CeisaProxy {
    pub fn mock_only() -> Self {
        Self { upstream: None }
    }

    pub fn with_upstream(upstream: Arc<dyn CeisaUpstream>) -> Self {
        Self {
            upstream: Some(upstream),
        }
    }

    pub fn from_config(config: &CeisaConfig) -> Result<Self, CeisaError> {
        match config.credentials() {
            Some((base_url, api_key)) => {
                let upstream = ReqwestUpstream::new(base_url, api_key, config.timeout)?;
                info!(base_url, "CEISA proxy forwarding to upstream");
                Ok(Self::with_upstream(Arc::new(upstream)))
            }
            None => {
                info!("CEISA credentials not configured; proxy serves mock data");
                Ok(Self::mock_only())
            }
        }
    }

    pub fn is_mock(&self) -> bool {
        self.upstream.is_none()
    }

    pub async fn handle(&self, request: CeisaRequest) -> Result<CeisaResponse, CeisaError> {
        match request.action {
            CeisaAction::Fetch => self.fetch(request.endpoint.trim(), &request.params).await,
            CeisaAction::HealthCheck => Ok(self.health_check().await),
        }
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<CeisaResponse, CeisaError> {
        if endpoint.is_empty() {
            return Err(CeisaError::MissingEndpoint);
        }

        let Some(upstream) = &self.upstream else {
            debug!(endpoint, "serving CEISA mock data");
            return Ok(CeisaResponse::mock(mock_payload(endpoint, params), None));
        };

        match upstream.fetch(endpoint, params).await {
            Ok(data) => Ok(CeisaResponse::upstream(data)),
            Err(err) => {
                warn!(endpoint, error = %err, "CEISA fetch failed; falling back to mock data");
                Ok(CeisaResponse::mock(
                    mock_payload(endpoint, params),
                    Some(err.to_string()),
                ))
            }
        }
    }

    async fn health_check(&self) -> CeisaResponse {
        let Some(upstream) = &self.upstream else {
            return CeisaResponse::mock(json!({ "status": "mock" }), None);
        };

        match upstream.health().await {
            Ok(()) => CeisaResponse::upstream(json!({ "status": "up" })),
            Err(err) => {
                warn!(error = %err, "CEISA health check failed");
                CeisaResponse {
                    success: false,
                    data: Some(json!({ "status": "down" })),
                    error: Some(err.to_string()),
                    source: CeisaSource::Ceisa,
                }
            }
        }
    }
}
