//! HTTP client for REST endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use precheck_core::{ErrorKind, Report, ReportSummary};

use crate::error::ClientError;

/// Body of `POST /v1/check-task`.
#[derive(Debug, Serialize)]
struct CheckTaskRequest<'a> {
    task: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline_ms: Option<u64>,
}

/// Error body returned by the master.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
}

/// HTTP client for the master API.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the master is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await.map_err(|e| self.connect_error(e))?;
        Ok(response.status().is_success())
    }

    /// Ask the master to precheck `raw_task`.
    ///
    /// Cancelling `cancel` abandons the request; the master notices the
    /// dropped connection and cancels the run.
    pub async fn check_task(
        &self,
        cancel: &CancellationToken,
        raw_task: &str,
        deadline: Option<Duration>,
    ) -> Result<Report, ClientError> {
        let url = format!("{}/v1/check-task", self.base_url);
        let body = CheckTaskRequest {
            task: raw_task,
            deadline_ms: deadline.map(|d| d.as_millis() as u64),
        };
        debug!(url = %url, bytes = raw_task.len(), "Submitting task for precheck");

        let send = async {
            let response = self
                .inner
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.connect_error(e))?;
            Self::decode(response).await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = send => result,
        }
    }

    /// Summaries of recent prechecks, newest first.
    pub async fn recent_prechecks(&self) -> Result<Vec<ReportSummary>, ClientError> {
        self.get_json("/v1/prechecks").await
    }

    /// A stored report by run id.
    pub async fn get_precheck(&self, run_id: &str) -> Result<Report, ClientError> {
        self.get_json(&format!("/v1/prechecks/{}", run_id)).await
    }

    /// Get JSON from an endpoint.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).send().await.map_err(|e| self.connect_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Serialization(e.to_string()));
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(ClientError::Rejected {
                status: status.as_u16(),
                kind: body.kind,
                message: body.error,
            }),
            Err(_) => Err(ClientError::Rejected {
                status: status.as_u16(),
                kind: ErrorKind::Internal,
                message: text,
            }),
        }
    }

    fn connect_error(&self, source: reqwest::Error) -> ClientError {
        if source.is_connect() || source.is_timeout() {
            ClientError::Connection {
                addr: self.base_url.clone(),
                source,
            }
        } else {
            ClientError::Http(source)
        }
    }
}
