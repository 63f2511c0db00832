// src/views/dashboard.rs

use async_trait::async_trait;
use std::fmt::Write;

use super::{LoadState, View, error_panel, heading};
use crate::client::ApiClient;
use crate::models::{DatasetCatalog, HealthStatus, ModelCatalog};
use crate::shell::Route;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub health: HealthStatus,
    pub models: ModelCatalog,
    pub datasets: DatasetCatalog,
}

/// Landing page: connection status, catalog counts and links to the other views.
pub struct DashboardView {
    base_url: String,
    pub data: LoadState<DashboardData>,
}

impl DashboardView {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            data: LoadState::Loading,
        }
    }
}

#[async_trait]
impl View for DashboardView {
    fn route(&self) -> Route {
        Route::Dashboard
    }

    async fn mount(&mut self, client: &ApiClient) {
        let loaded = futures::try_join!(client.health_check(), client.get_models(), client.get_datasets());
        self.data = LoadState::from_result(
            loaded.map(|(health, models, datasets)| DashboardData { health, models, datasets }),
        );
    }

    fn render(&self) -> String {
        let mut out = String::new();

        let data = match &self.data {
            LoadState::Loading => return "Loading...\n".to_string(),
            LoadState::Failed(message) => {
                error_panel(&mut out, "Connection Error", message);
                let _ = writeln!(out, "   Make sure the API server is reachable at {}", self.base_url);
                return out;
            }
            LoadState::Loaded(data) => data,
        };

        heading(&mut out, "Dashboard");
        let _ = writeln!(out, "HumanEvalComm API Testing and Evaluation Platform\n");

        let connected = if data.health.status == "healthy" { "Connected" } else { "Disconnected" };
        let _ = writeln!(out, "API Status: {}", connected);
        let _ = writeln!(out, "Models:     {} models", data.models.total());
        let _ = writeln!(out, "Datasets:   {} datasets", data.datasets.len());

        let _ = writeln!(out, "\nQuick Actions:");
        for route in Route::ALL.iter().filter(|r| **r != Route::Dashboard) {
            let _ = writeln!(out, "  {:<8} {} - {}", route.path(), route.title(), route.description());
        }

        let _ = writeln!(out, "\nAPI Information:");
        let _ = writeln!(out, "  Status:  {} (v{})", data.health.status, data.health.version);
        for (name, info) in &data.datasets {
            let _ = writeln!(out, "  {}: {} problems ({})", name, info.problems, info.kind);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::ScriptedTransport;
    use crate::client::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_failure_renders_connection_error_panel() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::Get, "/health", "error sending request for url (http://localhost:5000/health)");
        transport.respond(Method::Get, "/api/v1/models", 200, json!({"openai": ["gpt-4"]}));
        transport.respond(Method::Get, "/api/v1/datasets", 200, json!({}));
        let client = ApiClient::new(transport);

        let mut view = DashboardView::new("http://localhost:5000");
        view.mount(&client).await;

        let rendered = view.render();
        assert!(rendered.contains("Connection Error"));
        assert!(rendered.contains("http://localhost:5000"));
        assert!(!rendered.contains("Quick Actions"));
    }

    #[tokio::test]
    async fn healthy_service_shows_counts_and_actions() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::Get,
            "/health",
            200,
            json!({"status": "healthy", "timestamp": "2025-01-10T09:30:00", "version": "1.0.0"}),
        );
        transport.respond(
            Method::Get,
            "/api/v1/models",
            200,
            json!({"openai": ["gpt-3.5-turbo", "gpt-4"], "agents": ["Okanagan"]}),
        );
        transport.respond(
            Method::Get,
            "/api/v1/datasets",
            200,
            json!({
                "HumanEval": {"description": "Original HumanEval benchmark", "problems": 164, "type": "original"},
                "HumanEvalComm": {"description": "HumanEval with communication challenges", "problems": 762, "type": "modified"}
            }),
        );
        let client = ApiClient::new(transport);

        let mut view = DashboardView::new("http://localhost:5000");
        view.mount(&client).await;

        let rendered = view.render();
        assert!(rendered.contains("API Status: Connected"));
        assert!(rendered.contains("3 models"));
        assert!(rendered.contains("2 datasets"));
        assert!(rendered.contains("/async"));
        assert!(rendered.contains("healthy (v1.0.0)"));
    }
}
