// src/client/http.rs

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::errors::{DashboardError, Result};

/// `reqwest`-backed transport bound to one base origin.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(DashboardError::Config("base_url must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "Could not read response body".to_string());

        log::debug!("📥 {} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_without_double_slashes() {
        let transport = HttpTransport::new("https://api.humanevalcomm.pappuraj.com/", None).unwrap();
        assert_eq!(transport.base_url(), "https://api.humanevalcomm.pappuraj.com");
        assert_eq!(
            transport.url("/api/v1/models"),
            "https://api.humanevalcomm.pappuraj.com/api/v1/models"
        );
        assert_eq!(transport.url("health"), "https://api.humanevalcomm.pappuraj.com/health");
    }

    #[test]
    fn empty_base_is_rejected() {
        assert!(HttpTransport::new("   ", None).is_err());
    }
}
