//! HTTP client for a running visualizer API

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::projection::{ClusterSummary, JobView, NodeView, QueueView};
use crate::server::API_PREFIX;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

// ============================================================================
// SBIO: Pure request construction
// ============================================================================

/// Full URL for a visualizer endpoint
pub fn endpoint_url(base_url: &str, resource: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), API_PREFIX, resource)
}

/// Query pairs for the jobs endpoint; an empty namespace sends none
pub fn jobs_query(namespace: Option<&str>) -> Vec<(&'static str, String)> {
    match namespace {
        Some(ns) if !ns.is_empty() => vec![("namespace", ns.to_string())],
        _ => Vec::new(),
    }
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

/// Client for the `/api/v1/visualizer` endpoints
#[derive(Clone)]
pub struct VisualizerClient {
    client: reqwest::Client,
    base_url: String,
}

impl VisualizerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn summary(&self) -> Result<ClusterSummary, ClientError> {
        self.get("summary", &[]).await
    }

    pub async fn queues(&self) -> Result<Vec<QueueView>, ClientError> {
        self.get("queues", &[]).await
    }

    pub async fn jobs(&self, namespace: Option<&str>) -> Result<Vec<JobView>, ClientError> {
        self.get("jobs", &jobs_query(namespace)).await
    }

    pub async fn nodes(&self) -> Result<Vec<NodeView>, ClientError> {
        self.get("nodes", &[]).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        let url = endpoint_url(&self.base_url, resource);
        debug!("GET {}", url);

        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}
