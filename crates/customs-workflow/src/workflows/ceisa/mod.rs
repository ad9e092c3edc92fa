//! Proxy to the national customs API (CEISA) with an explicit mock fallback.

mod mock;
mod proxy;
mod router;
mod upstream;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use mock::{mock_payload, MockDataset, DEFAULT_LIMIT, MAX_LIMIT};
pub use proxy::CeisaProxy;
pub use router::ceisa_router;
pub use upstream::{CeisaUpstream, ReqwestUpstream};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeisaAction {
    #[default]
    Fetch,
    HealthCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeisaRequest {
    #[serde(default)]
    pub action: CeisaAction,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl CeisaRequest {
    pub fn fetch(endpoint: impl Into<String>) -> Self {
        Self {
            action: CeisaAction::Fetch,
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn health_check() -> Self {
        Self {
            action: CeisaAction::HealthCheck,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Where the payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeisaSource {
    Ceisa,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeisaResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: CeisaSource,
}

impl CeisaResponse {
    pub(crate) fn upstream(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source: CeisaSource::Ceisa,
        }
    }

    pub(crate) fn mock(data: Value, error: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error,
            source: CeisaSource::Mock,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CeisaError {
    #[error("CEISA upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("failed to build CEISA client: {0}")]
    Client(String),
    #[error("a CEISA endpoint is required for fetch requests")]
    MissingEndpoint,
}
