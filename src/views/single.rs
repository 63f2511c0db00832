// src/views/single.rs

use async_trait::async_trait;
use std::fmt::Write;

use super::form::{EvaluationForm, FormKind, Outcome};
use super::{Catalog, LoadState, View, error_panel, heading, render_catalog_choices, render_result};
use crate::client::ApiClient;
use crate::shell::Route;

pub struct SingleEvaluationView {
    pub catalog: LoadState<Catalog>,
    pub form: EvaluationForm,
}

impl SingleEvaluationView {
    pub fn new(form: EvaluationForm) -> Self {
        debug_assert_eq!(form.kind(), FormKind::Single);
        Self {
            catalog: LoadState::Loading,
            form,
        }
    }

    pub async fn submit(&mut self, client: &ApiClient) -> bool {
        self.form.submit(client).await.is_some()
    }
}

impl Default for SingleEvaluationView {
    fn default() -> Self {
        Self::new(EvaluationForm::new(FormKind::Single))
    }
}

#[async_trait]
impl View for SingleEvaluationView {
    fn route(&self) -> Route {
        Route::Single
    }

    async fn mount(&mut self, client: &ApiClient) {
        self.catalog = Catalog::load(client).await;
    }

    fn render(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Single Evaluation");
        let _ = writeln!(out, "Evaluate a single coding problem with the selected model.\n");
        render_catalog_choices(&mut out, &self.catalog, &self.form.draft);
        let _ = writeln!(out);
        self.form.render_draft(&mut out);
        self.form.render_submit(&mut out);
        let _ = writeln!(out);

        if self.form.is_submitting() {
            let _ = writeln!(out, "⏳ Evaluating...");
        }
        if let Some(error) = self.form.error() {
            error_panel(&mut out, "Error", error);
        }
        match self.form.outcome() {
            Some(Outcome::Evaluated(result)) => {
                let _ = writeln!(out, "✅ Evaluation Complete\n");
                render_result(&mut out, result);
            }
            Some(_) => {}
            None if self.form.error().is_none() => {
                let _ = writeln!(out, "Submit a problem to see the model's response.");
            }
            None => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::ScriptedTransport;
    use crate::client::Method;
    use crate::models::Phase;
    use serde_json::json;
    use std::sync::Arc;

    fn scripted() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::Get,
            "/api/v1/models",
            200,
            json!({"openai": ["gpt-3.5-turbo", "gpt-4"], "agents": ["Okanagan", "AgentCoder"]}),
        );
        transport.respond(
            Method::Get,
            "/api/v1/datasets",
            200,
            json!({
                "HumanEval": {"description": "Original HumanEval benchmark", "problems": 164, "type": "original"}
            }),
        );
        transport
    }

    #[tokio::test]
    async fn single_evaluation_scenario_renders_matching_result() {
        let transport = scripted();
        transport.respond(
            Method::Post,
            "/api/v1/evaluate",
            200,
            json!({
                "dataset": "HumanEval",
                "model": "gpt-3.5-turbo",
                "phase": 0,
                "problem_name": "custom_problem",
                "response": "Here is a function that adds two numbers.",
                "code": "def add(a, b):\n    return a + b",
                "timestamp": "2025-01-10T09:30:00"
            }),
        );
        let client = ApiClient::new(transport.clone());

        let mut view = SingleEvaluationView::default();
        view.mount(&client).await;
        assert!(view.catalog.loaded().is_some());

        view.form.draft.dataset = "HumanEval".to_string();
        view.form.draft.model = "gpt-3.5-turbo".to_string();
        view.form.draft.problem_text = "Write a function that adds two numbers".to_string();
        view.form.draft.phase = Phase::InitialResponse;
        assert!(view.submit(&client).await);

        let Some(Outcome::Evaluated(result)) = view.form.outcome() else {
            panic!("expected an evaluation result");
        };
        assert_eq!(result.dataset, "HumanEval");
        assert_eq!(result.model, "gpt-3.5-turbo");
        assert_eq!(result.phase, Phase::InitialResponse);
        assert!(!result.response.is_empty());
        assert!(!result.code.is_empty());

        let rendered = view.render();
        assert!(rendered.contains("Evaluation Complete"));
        assert!(rendered.contains("Phase 0: Initial Response"));
        assert!(rendered.contains("def add(a, b):"));
    }

    #[tokio::test]
    async fn catalog_failure_is_rendered_not_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::Get, "/api/v1/models", "connection refused");
        let client = ApiClient::new(transport);

        let mut view = SingleEvaluationView::default();
        view.mount(&client).await;
        assert_eq!(view.catalog.error(), Some("Failed to load API data"));
        assert!(view.render().contains("Failed to load API data"));
    }
}
