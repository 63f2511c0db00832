// src/views/mod.rs
//! Per-route view controllers. Each view owns its state outright; nothing is shared
//! between views.

use async_trait::async_trait;
use std::fmt::Write;

use crate::client::ApiClient;
use crate::models::{DatasetCatalog, EvaluationResult, ModelCatalog, display_timestamp};
use crate::shell::Route;

pub mod async_eval;
pub mod batch;
pub mod dashboard;
pub mod form;
pub mod info;
pub mod single;

pub use async_eval::AsyncEvaluationView;
pub use batch::BatchEvaluationView;
pub use dashboard::DashboardView;
pub use form::{EvaluationDraft, EvaluationForm, FormKind, Outcome, Submission};
pub use info::ApiInfoView;
pub use single::SingleEvaluationView;

#[async_trait]
pub trait View: Send {
    fn route(&self) -> Route;

    /// Load reference data. Called once, before the first render.
    async fn mount(&mut self, client: &ApiClient);

    fn render(&self) -> String;
}

/// Reference data fetched once when a view mounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState<T> {
    #[default]
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Models and datasets, needed by every evaluation form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub models: ModelCatalog,
    pub datasets: DatasetCatalog,
}

impl Catalog {
    pub async fn load(client: &ApiClient) -> LoadState<Catalog> {
        match client.load_catalog().await {
            Ok((models, datasets)) => LoadState::Loaded(Catalog { models, datasets }),
            Err(e) => {
                log::error!("Failed to load API data: {}", e);
                LoadState::Failed("Failed to load API data".to_string())
            }
        }
    }
}

fn mark(option: &str, selected: &str) -> String {
    if option == selected {
        format!("[{}]", option)
    } else {
        option.to_string()
    }
}

pub(crate) fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

pub(crate) fn error_panel(out: &mut String, title: &str, message: &str) {
    let _ = writeln!(out, "❌ {}", title);
    let _ = writeln!(out, "   {}", message);
}

/// Lists the server's datasets and models, bracketing the ones the draft selects.
pub(crate) fn render_catalog_choices(out: &mut String, catalog: &LoadState<Catalog>, draft: &EvaluationDraft) {
    match catalog {
        LoadState::Loading => {
            let _ = writeln!(out, "Loading models and datasets...");
        }
        LoadState::Failed(message) => error_panel(out, "Error", message),
        LoadState::Loaded(catalog) => {
            let datasets: Vec<String> = catalog.datasets.keys().map(|d| mark(d, &draft.dataset)).collect();
            let _ = writeln!(out, "Datasets: {}", datasets.join(", "));
            let models: Vec<String> = catalog.models.all_models().into_iter().map(|m| mark(m, &draft.model)).collect();
            let _ = writeln!(out, "Models:   {}", models.join(", "));

            if !catalog.datasets.contains_key(&draft.dataset) {
                let _ = writeln!(out, "⚠️  Dataset '{}' is not offered by the server", draft.dataset);
            }
            if !catalog.models.contains(&draft.model) {
                let _ = writeln!(out, "⚠️  Model '{}' is not offered by the server", draft.model);
            }
        }
    }
}

pub(crate) fn render_result(out: &mut String, result: &EvaluationResult) {
    if !result.problem_name.is_empty() {
        let _ = writeln!(out, "Problem:   {}", result.problem_name);
    }
    let _ = writeln!(out, "Model:     {}", result.model);
    let _ = writeln!(out, "Dataset:   {}", result.dataset);
    let _ = writeln!(out, "Phase:     {}", result.phase);
    if !result.timestamp.is_empty() {
        let _ = writeln!(out, "Timestamp: {}", display_timestamp(&result.timestamp));
    }
    let _ = writeln!(out, "\nResponse:\n{}", result.response);
    let _ = writeln!(out, "\nGenerated Code:\n{}", result.code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;

    #[test]
    fn load_state_tracks_outcome() {
        let ok: LoadState<u32> = LoadState::from_result(Ok::<_, DashboardError>(3));
        assert_eq!(ok.loaded(), Some(&3));
        assert!(ok.error().is_none());

        let failed: LoadState<u32> =
            LoadState::from_result(Err(DashboardError::Transport("refused".to_string())));
        assert_eq!(failed.error(), Some("Network Error: refused"));
    }

    #[test]
    fn choices_mark_the_selection_and_flag_unknown_models() {
        let catalog: Catalog = Catalog {
            models: serde_json::from_value(serde_json::json!({
                "openai": ["gpt-3.5-turbo", "gpt-4"],
                "agents": ["Okanagan"]
            }))
            .unwrap(),
            datasets: serde_json::from_value(serde_json::json!({
                "HumanEval": {"description": "d", "problems": 164, "type": "original"}
            }))
            .unwrap(),
        };
        let loaded = LoadState::Loaded(catalog);

        let mut draft = FormKind::Single.default_draft();
        let mut out = String::new();
        render_catalog_choices(&mut out, &loaded, &draft);
        assert!(out.contains("Datasets: [HumanEval]"));
        assert!(out.contains("Models:   [gpt-3.5-turbo], gpt-4, Okanagan"));
        assert!(!out.contains("not offered"));

        draft.model = "gpt-5".to_string();
        let mut out = String::new();
        render_catalog_choices(&mut out, &loaded, &draft);
        assert!(out.contains("Model 'gpt-5' is not offered by the server"));
    }
}
