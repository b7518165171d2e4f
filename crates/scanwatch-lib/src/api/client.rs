//! HTTP client for the Secure metrics and data source APIs

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ApiError, Endpoint};
use crate::models::{AgentList, ClusterList, TimeRange, UsageTimeseries};

/// Filter selecting findings and usage attributed to runtime scanning
const RUNTIME_CONTEXT_FILTER: &str = "context = \"runtime\"";

/// Configuration for the Secure API client
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme and authority every endpoint path is joined onto
    pub base_url: Url,
    /// Bearer token sent on every request
    pub api_token: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Maximum clusters returned by the cluster filter call
    pub cluster_limit: u32,
    /// Page size of the agent listing call
    pub agent_limit: u32,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
}

impl ClientConfig {
    /// Build a configuration for `https://{authority}`
    pub fn new(authority: &str, api_token: impl Into<String>) -> Result<Self, ApiError> {
        let authority = authority.trim();
        if authority.is_empty() || authority.contains(['/', '?', '#', ' ']) {
            return Err(ApiError::InvalidAuthority(authority.to_string()));
        }

        let base_url = Url::parse(&format!("https://{}", authority))
            .map_err(|_| ApiError::InvalidAuthority(authority.to_string()))?;

        Ok(Self::with_base_url(base_url, api_token))
    }

    /// Build a configuration against an explicit base URL
    pub fn with_base_url(base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_token: api_token.into(),
            request_timeout: Duration::from_secs(3),
            cluster_limit: 500,
            agent_limit: 50,
            max_redirects: 10,
        }
    }

    /// Set a custom request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cluster_limit(mut self, limit: u32) -> Self {
        self.cluster_limit = limit;
        self
    }

    pub fn with_agent_limit(mut self, limit: u32) -> Self {
        self.agent_limit = limit;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("cluster_limit", &self.cluster_limit)
            .field("agent_limit", &self.agent_limit)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// Client for the three Secure API calls a scan makes
pub struct SecureClient {
    client: Client,
    config: ClientConfig,
}

impl SecureClient {
    /// Create a new client with auth and JSON headers preset
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// List clusters that have runtime vulnerability findings in `range`
    pub async fn list_clusters(&self, range: TimeRange) -> Result<ClusterList, ApiError> {
        let url = self.url(
            Endpoint::ClusterFilter,
            &[
                ("from", range.from.to_string()),
                ("to", range.to.to_string()),
                ("filter", RUNTIME_CONTEXT_FILTER.to_string()),
                ("limit", self.config.cluster_limit.to_string()),
            ],
        );
        self.get(Endpoint::ClusterFilter, url).await
    }

    /// Fetch the daily runtime scan-volume series for one cluster
    pub async fn usage_timeseries(
        &self,
        cluster: &str,
        range: TimeRange,
    ) -> Result<UsageTimeseries, ApiError> {
        let url = self.url(
            Endpoint::UsageTimeseries,
            &[
                ("from", range.from.to_string()),
                ("to", range.to.to_string()),
                ("group", "context".to_string()),
                ("filter", cluster_usage_filter(cluster)),
            ],
        );
        self.get(Endpoint::UsageTimeseries, url).await
    }

    /// List the agents reporting for a cluster
    pub async fn agents(&self, cluster: &str) -> Result<AgentList, ApiError> {
        let url = self.url(
            Endpoint::Agents,
            &[
                ("limit", self.config.agent_limit.to_string()),
                ("offset", "0".to_string()),
                ("filter", cluster.to_string()),
            ],
        );
        self.get(Endpoint::Agents, url).await
    }

    /// Build an endpoint URL with a form-encoded query
    pub(crate) fn url(&self, endpoint: Endpoint, query: &[(&str, String)]) -> Url {
        let mut url = self.config.base_url.clone();
        url.set_path(endpoint.path());
        url.query_pairs_mut()
            .clear()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint, url: Url) -> Result<T, ApiError> {
        debug!(endpoint = %endpoint, path = %url.path(), "Sending request");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(endpoint = %endpoint, status = status.as_u16(), "Unexpected response status");
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint,
            });
        }

        let body = response.bytes().await?;
        debug!(endpoint = %endpoint, bytes = body.len(), "Received response");

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

fn cluster_usage_filter(cluster: &str) -> String {
    format!("{} and cluster in (\"{}\")", RUNTIME_CONTEXT_FILTER, cluster)
}
