use crate::prompb::{Query, QueryResult, TimeSeries};
use crate::reader::{HealthChecker, Querier};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error};

const QUERY_ENDPOINT: &str = "/api/v1/query";
const HEALTH_ENDPOINT: &str = "/health";

#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("backend returned {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },

    #[error("outbound request limiter closed")]
    LimiterClosed,
}

/// Store reached over HTTP.
///
/// Each query is POSTed as JSON to `{url}/api/v1/query` and answered with a `QueryResult`;
/// `{url}/health` answering 2xx means the backend is usable.
pub struct RemoteStore {
    client: Client,
    url: Url,
    token: Option<String>,
    semaphore: Arc<Semaphore>,
}

impl RemoteStore {
    pub fn new(
        client: Client,
        url: &str,
        token: Option<String>,
        semaphore: Arc<Semaphore>,
    ) -> Result<Self, RemoteStoreError> {
        // Parse and validate backend URL at startup
        let parsed = Url::parse(url).map_err(|e| RemoteStoreError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            url: parsed,
            token,
            semaphore,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => builder.header("Authorization", format!("Bearer {}", t)),
            None => builder,
        }
    }

    async fn send(
        &self,
        endpoint: String,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteStoreError> {
        let resp = self
            .authorize(builder)
            .send()
            .await
            .map_err(|source| {
                error!("Backend request to {} failed: {}", endpoint, source);
                RemoteStoreError::Request {
                    endpoint: endpoint.clone(),
                    source,
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Backend {} answered with status {}", endpoint, status);
            return Err(RemoteStoreError::Status { endpoint, status });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Querier for RemoteStore {
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<TimeSeries>> {
        let endpoint = self.endpoint(QUERY_ENDPOINT);
        // Acquire permit for bounded concurrency; held until the body is read
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RemoteStoreError::LimiterClosed)?;

        let builder = self.client.post(&endpoint).json(query);
        let resp = self.send(endpoint.clone(), builder).await?;
        let result: QueryResult = resp
            .json()
            .await
            .map_err(|source| RemoteStoreError::Request { endpoint, source })?;
        debug!("Backend returned {} series", result.timeseries.len());
        Ok(result.timeseries)
    }
}

#[async_trait]
impl HealthChecker for RemoteStore {
    /// Not subject to the outbound limit, so query load cannot starve it.
    async fn health_check(&self) -> anyhow::Result<()> {
        let endpoint = self.endpoint(HEALTH_ENDPOINT);
        let builder = self.client.get(&endpoint);
        self.send(endpoint, builder).await?;
        Ok(())
    }
}
