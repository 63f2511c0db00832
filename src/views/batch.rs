// src/views/batch.rs

use async_trait::async_trait;
use std::fmt::Write;

use super::form::{EvaluationForm, FormKind, Outcome};
use super::{Catalog, LoadState, View, error_panel, heading, render_catalog_choices};
use crate::client::ApiClient;
use crate::models::{BatchEvaluationResponse, display_timestamp};
use crate::shell::Route;

pub struct BatchEvaluationView {
    pub catalog: LoadState<Catalog>,
    pub form: EvaluationForm,
}

impl BatchEvaluationView {
    pub fn new(form: EvaluationForm) -> Self {
        debug_assert_eq!(form.kind(), FormKind::Batch);
        Self {
            catalog: LoadState::Loading,
            form,
        }
    }

    pub async fn submit(&mut self, client: &ApiClient) -> bool {
        self.form.submit(client).await.is_some()
    }

    /// Submit button label, e.g. "Evaluate Batch (3 problems)".
    pub fn submit_label(&self) -> String {
        self.form.submit_label()
    }
}

impl Default for BatchEvaluationView {
    fn default() -> Self {
        Self::new(EvaluationForm::new(FormKind::Batch))
    }
}

fn render_batch(out: &mut String, response: &BatchEvaluationResponse) {
    let _ = writeln!(out, "✅ Batch Evaluation Complete\n");
    let _ = writeln!(out, "Dataset:        {}", response.dataset);
    let _ = writeln!(out, "Model:          {}", response.model);
    let _ = writeln!(out, "Total Problems: {}", response.total_problems);
    if !response.timestamp.is_empty() {
        let _ = writeln!(out, "Timestamp:      {}", display_timestamp(&response.timestamp));
    }
    for (i, result) in response.results.iter().enumerate() {
        let _ = writeln!(out, "\n#{} {}", i + 1, result.problem_name);
        let _ = writeln!(out, "Response:\n{}", result.response);
        let _ = writeln!(out, "Code:\n{}", result.code);
        if let Some(quality) = result.question_quality.as_deref().filter(|q| !q.is_empty()) {
            let _ = writeln!(out, "Question Quality: {}", quality);
        }
        if let Some(answer) = result.answer.as_deref().filter(|a| !a.is_empty()) {
            let _ = writeln!(out, "Answer: {}", answer);
        }
    }
}

#[async_trait]
impl View for BatchEvaluationView {
    fn route(&self) -> Route {
        Route::Batch
    }

    async fn mount(&mut self, client: &ApiClient) {
        self.catalog = Catalog::load(client).await;
    }

    fn render(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Batch Evaluation");
        let _ = writeln!(out, "Evaluate several problems in one request.\n");
        render_catalog_choices(&mut out, &self.catalog, &self.form.draft);
        let _ = writeln!(out);
        self.form.render_draft(&mut out);
        let _ = writeln!(out);
        self.form.render_submit(&mut out);

        if self.form.is_submitting() {
            let _ = writeln!(out, "⏳ Evaluating batch...");
        }
        if let Some(error) = self.form.error() {
            error_panel(&mut out, "Error", error);
        }
        if let Some(Outcome::Batch(response)) = self.form.outcome() {
            let _ = writeln!(out);
            render_batch(&mut out, response);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::ScriptedTransport;
    use crate::client::Method;
    use crate::models::Problem;
    use crate::views::form::EMPTY_BATCH;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn submits_only_complete_problems() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            Method::Post,
            "/api/v1/evaluate/batch",
            200,
            json!({
                "dataset": "HumanEval",
                "model": "gpt-3.5-turbo",
                "total_problems": 1,
                "timestamp": "2025-01-10T09:30:00",
                "results": [{
                    "problem_name": "add_numbers",
                    "response": "Mock response for add_numbers",
                    "code": "def add_numbers():\n    return \"Hello from add_numbers\"",
                    "question_quality": "0",
                    "answer": ""
                }]
            }),
        );
        let client = ApiClient::new(transport.clone());

        let mut view = BatchEvaluationView::default();
        view.form.draft.problems = vec![
            Problem::new("add_numbers", "Write a function that adds two numbers"),
            Problem::new("", "   "),
        ];
        assert_eq!(view.submit_label(), "Evaluate Batch (1 problems)");
        assert!(view.submit(&client).await);

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["problems"].as_array().unwrap().len(), 1);
        assert_eq!(body["temperature"], 1.0);

        let rendered = view.render();
        assert!(rendered.contains("Total Problems: 1"));
        assert!(rendered.contains("#1 add_numbers"));
        assert!(rendered.contains("Question Quality: 0"));
        assert!(!rendered.contains("Answer:"));
    }

    #[tokio::test]
    async fn empty_batch_shows_inline_message() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = ApiClient::new(transport.clone());

        let mut view = BatchEvaluationView::default();
        assert!(!view.submit(&client).await);
        assert!(transport.calls().is_empty());
        let rendered = view.render();
        assert!(rendered.contains(EMPTY_BATCH));
        assert!(rendered.contains("[Evaluate Batch (0 problems)] (disabled)"));
    }
}
