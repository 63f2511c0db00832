// src/client/mod.rs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::errors::{DashboardError, Result};
use crate::models::{
    AsyncSubmission, BatchEvaluationRequest, BatchEvaluationResponse, DatasetCatalog, EvaluationRequest,
    EvaluationResult, HealthStatus, ModelCatalog, PhaseCatalog, Task,
};

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One outbound call, relative to the transport's base origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), body: None }
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self> {
        Ok(Self {
            method: Method::Post,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// Raw response as received. The status is not interpreted by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves a request over the wire.
///
/// Implementations return `Err(DashboardError::Transport)` only when no response was
/// received; HTTP error statuses come back as a normal `ApiResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Typed access to the evaluation service.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Builds a client backed by `HttpTransport` for the configured origin.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.call(ApiRequest::get("/health")).await
    }

    pub async fn get_models(&self) -> Result<ModelCatalog> {
        self.call(ApiRequest::get("/api/v1/models")).await
    }

    pub async fn get_datasets(&self) -> Result<DatasetCatalog> {
        self.call(ApiRequest::get("/api/v1/datasets")).await
    }

    pub async fn get_phases(&self) -> Result<PhaseCatalog> {
        self.call(ApiRequest::get("/api/v1/phases")).await
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        self.call(ApiRequest::post("/api/v1/evaluate", request)?).await
    }

    pub async fn evaluate_async(&self, request: &EvaluationRequest) -> Result<AsyncSubmission> {
        self.call(ApiRequest::post("/api/v1/evaluate/async", request)?).await
    }

    pub async fn get_task_status(&self, task_id: &str) -> Result<Task> {
        if task_id.trim().is_empty() {
            return Err(DashboardError::Validation("task id must not be empty".to_string()));
        }
        let path_safe = task_id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !path_safe || task_id == "." || task_id == ".." {
            return Err(DashboardError::Validation(format!("invalid task id '{}'", task_id)));
        }
        let mut task: Task = self.call(ApiRequest::get(format!("/api/v1/tasks/{}", task_id))).await?;
        if task.task_id.is_empty() {
            task.task_id = task_id.to_string();
        }
        Ok(task)
    }

    pub async fn evaluate_batch(&self, request: &BatchEvaluationRequest) -> Result<BatchEvaluationResponse> {
        self.call(ApiRequest::post("/api/v1/evaluate/batch", request)?).await
    }

    /// Fetches the model and dataset catalogs concurrently; fails if either fails.
    pub async fn load_catalog(&self) -> Result<(ModelCatalog, DatasetCatalog)> {
        futures::try_join!(self.get_models(), self.get_datasets())
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        log::info!("🚀 API Request: {} {}", request.method, request.path);

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("❌ API Request Error: {} {}: {}", request.method, request.path, e);
                return Err(e);
            }
        };

        if !response.is_success() {
            let message = server_error_message(&response.body)
                .unwrap_or_else(|| format!("Request failed with status code {}", response.status));
            log::error!("❌ API Response Error: {} {}: {}", response.status, request.path, message);
            return Err(DashboardError::Api { status: response.status, message });
        }

        log::info!("✅ API Response: {} {}", response.status, request.path);

        serde_json::from_str(&response.body).map_err(|e| {
            DashboardError::UnexpectedResponse(format!("{} {}: {}", request.method, request.path, e))
        })
    }
}

/// Extracts `{"error": "..."}` from an error body.
fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
