// src/views/info.rs

use async_trait::async_trait;
use serde_json::json;
use std::fmt::Write;

use super::{LoadState, View, error_panel, heading};
use crate::client::{ApiClient, Method};
use crate::models::{DatasetCatalog, HealthStatus, ModelCatalog, PhaseCatalog, display_timestamp};
use crate::shell::Route;

pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
    pub description: &'static str,
    pub example_body: Option<fn() -> serde_json::Value>,
}

fn evaluate_example() -> serde_json::Value {
    json!({"dataset": "HumanEval", "model": "gpt-3.5-turbo", "problem_text": "Write a function that adds two numbers"})
}

fn async_example() -> serde_json::Value {
    json!({"dataset": "HumanEvalComm", "model": "gpt-3.5-turbo", "problem_text": "Write a function that processes strings"})
}

fn batch_example() -> serde_json::Value {
    json!({"dataset": "HumanEval", "model": "gpt-3.5-turbo", "problems": [{"name": "add", "text": "Add two numbers"}]})
}

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint { method: Method::Get, path: "/health", description: "Check API server health status", example_body: None },
    Endpoint { method: Method::Get, path: "/api/v1/models", description: "Get available models", example_body: None },
    Endpoint { method: Method::Get, path: "/api/v1/datasets", description: "Get available datasets", example_body: None },
    Endpoint { method: Method::Get, path: "/api/v1/phases", description: "Get evaluation phases", example_body: None },
    Endpoint {
        method: Method::Post,
        path: "/api/v1/evaluate",
        description: "Evaluate single problem",
        example_body: Some(evaluate_example),
    },
    Endpoint {
        method: Method::Post,
        path: "/api/v1/evaluate/async",
        description: "Start async evaluation",
        example_body: Some(async_example),
    },
    Endpoint { method: Method::Get, path: "/api/v1/tasks/{task_id}", description: "Get task status", example_body: None },
    Endpoint {
        method: Method::Post,
        path: "/api/v1/evaluate/batch",
        description: "Evaluate multiple problems",
        example_body: Some(batch_example),
    },
];

impl Endpoint {
    /// A copy-pasteable `curl` line against `base_url`.
    pub fn curl_example(&self, base_url: &str) -> String {
        let path = self.path.replace("{task_id}", "task_1234567890");
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        match (self.method, self.example_body) {
            (Method::Post, Some(body)) => format!(
                "curl -X POST {} \\\n  -H \"Content-Type: application/json\" \\\n  -d '{}'",
                url,
                body()
            ),
            (Method::Post, None) => format!("curl -X POST {}", url),
            (Method::Get, _) => format!("curl {}", url),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiInfo {
    pub health: HealthStatus,
    pub models: ModelCatalog,
    pub datasets: DatasetCatalog,
    pub phases: PhaseCatalog,
}

/// Service metadata plus a reference of every endpoint.
pub struct ApiInfoView {
    base_url: String,
    pub info: LoadState<ApiInfo>,
}

impl ApiInfoView {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            info: LoadState::Loading,
        }
    }

    fn render_info(&self, out: &mut String, info: &ApiInfo) {
        let _ = writeln!(out, "Server Status");
        let _ = writeln!(out, "  Status:    {}", info.health.status);
        let _ = writeln!(out, "  Version:   {}", info.health.version);
        if !info.health.timestamp.is_empty() {
            let _ = writeln!(out, "  Timestamp: {}", display_timestamp(&info.health.timestamp));
        }

        let _ = writeln!(out, "\nAvailable Models");
        for (category, models) in info.models.categories() {
            let _ = writeln!(out, "  {}:", category.replace('_', " "));
            for model in models {
                let _ = writeln!(out, "    - {}", model);
            }
        }

        let _ = writeln!(out, "\nAvailable Datasets");
        for (name, dataset) in &info.datasets {
            let _ = writeln!(out, "  {} ({}, {} problems)", name, dataset.kind, dataset.problems);
            let _ = writeln!(out, "    {}", dataset.description);
            if let Some(categories) = &dataset.categories {
                let _ = writeln!(out, "    Categories: {}", categories.join(", "));
            }
        }

        let _ = writeln!(out, "\nEvaluation Phases");
        let mut phases: Vec<_> = info.phases.iter().collect();
        phases.sort_by_key(|(id, _)| id.parse::<u32>().unwrap_or(u32::MAX));
        for (id, phase) in phases {
            let _ = writeln!(out, "  Phase {}: {}", id, phase.name);
            let _ = writeln!(out, "    {}", phase.description);
            let _ = writeln!(out, "    Output: {}", phase.output);
        }
    }
}

#[async_trait]
impl View for ApiInfoView {
    fn route(&self) -> Route {
        Route::Info
    }

    async fn mount(&mut self, client: &ApiClient) {
        let loaded = futures::try_join!(
            client.health_check(),
            client.get_models(),
            client.get_datasets(),
            client.get_phases()
        );
        self.info = LoadState::from_result(
            loaded.map(|(health, models, datasets, phases)| ApiInfo { health, models, datasets, phases }),
        );
    }

    fn render(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "API Information");

        match &self.info {
            LoadState::Loading => {
                let _ = writeln!(out, "Loading...");
                return out;
            }
            LoadState::Failed(message) => {
                error_panel(&mut out, "Error Loading API Information", message);
                return out;
            }
            LoadState::Loaded(info) => self.render_info(&mut out, info),
        }

        let _ = writeln!(out, "\nAPI Endpoints (base: {})", self.base_url);
        for endpoint in ENDPOINTS {
            let _ = writeln!(out, "\n  {:<4} {}", endpoint.method.to_string(), endpoint.path);
            let _ = writeln!(out, "  {}", endpoint.description);
            for line in endpoint.curl_example(&self.base_url).lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }

        let sample = json!({
            "dataset": "HumanEval",
            "model": "gpt-3.5-turbo",
            "problem_text": "Write a function that adds two numbers",
            "phase": 0
        });
        let _ = writeln!(out, "\nSample Request Body");
        let _ = writeln!(out, "{}", serde_json::to_string_pretty(&sample).unwrap_or_default());
        out
    }
}
