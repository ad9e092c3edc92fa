use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::CeisaError;

/// Live customs API behind the proxy.
#[async_trait]
pub trait CeisaUpstream: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, CeisaError>;

    async fn health(&self) -> Result<(), CeisaError>;
}

/// HTTP client forwarding params as a query string with a bearer token.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ReqwestUpstream {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CeisaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("customs-workflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CeisaError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

fn unavailable(err: reqwest::Error) -> CeisaError {
    CeisaError::UpstreamUnavailable(err.to_string())
}

#[async_trait]
impl CeisaUpstream for ReqwestUpstream {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, CeisaError> {
        self.client
            .get(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json::<Value>()
            .await
            .map_err(unavailable)
    }

    async fn health(&self) -> Result<(), CeisaError> {
        self.client
            .get(self.url("health"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let upstream =
            ReqwestUpstream::new("https://ceisa.example.test/api/", "key", Duration::from_secs(1))
                .expect("client builds");
        assert_eq!(
            upstream.url("/exports/peb"),
            "https://ceisa.example.test/api/exports/peb"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_classified_as_unavailable() {
        let upstream =
            ReqwestUpstream::new("http://127.0.0.1:9", "key", Duration::from_millis(200))
                .expect("client builds");
        let result = upstream.fetch("exports/peb", &BTreeMap::new()).await;
        assert!(matches!(result, Err(CeisaError::UpstreamUnavailable(_))));
    }
}
