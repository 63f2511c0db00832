// src/views/form.rs
//! The request draft and submit cycle shared by the single, async and batch views.

use std::fmt::Write;

use crate::client::ApiClient;
use crate::errors::{DashboardError, Result};
use crate::models::{
    AsyncSubmission, BatchEvaluationRequest, BatchEvaluationResponse, EvalOption, EvaluationRequest,
    EvaluationResult, Phase, Problem,
};

pub const EMPTY_PROBLEM_TEXT: &str = "Please enter a problem description";
pub const EMPTY_BATCH: &str = "Please add at least one problem with both name and text";

/// Which view a form belongs to. Fixes the endpoint and the fields on show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Single,
    Async,
    Batch,
}

impl FormKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            FormKind::Single => "/api/v1/evaluate",
            FormKind::Async => "/api/v1/evaluate/async",
            FormKind::Batch => "/api/v1/evaluate/batch",
        }
    }

    pub fn shows_temperature(self) -> bool {
        matches!(self, FormKind::Single | FormKind::Batch)
    }

    pub fn shows_topn(self) -> bool {
        self == FormKind::Single
    }

    pub fn shows_option(self) -> bool {
        self == FormKind::Single
    }

    pub fn uses_problem_list(self) -> bool {
        self == FormKind::Batch
    }

    /// Quick-fill problem descriptions offered by the single-text forms.
    pub fn sample_texts(self) -> &'static [&'static str] {
        match self {
            FormKind::Single => &[
                "Write a function that returns the sum of two numbers",
                "Write a function that finds the maximum value in a list",
                "Write a function that checks if a string is a palindrome",
                "Write a function that sorts a list of numbers in ascending order",
            ],
            FormKind::Async => &[
                "Write a function that processes a list of strings and returns the longest one",
                "Create a function that validates email addresses using regex",
                "Implement a function that finds the intersection of two arrays",
                "Write a function that converts a nested dictionary to a flat dictionary",
            ],
            FormKind::Batch => &[],
        }
    }

    pub fn default_draft(self) -> EvaluationDraft {
        let dataset = match self {
            FormKind::Async => "HumanEvalComm",
            FormKind::Single | FormKind::Batch => "HumanEval",
        };
        EvaluationDraft {
            dataset: dataset.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            phase: Phase::InitialResponse,
            problem_text: String::new(),
            temperature: 1.0,
            topn: 1,
            option: EvalOption::Original,
            problems: vec![Problem::default()],
        }
    }
}

/// Everything the user can edit. Fields a kind doesn't show are ignored when building.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDraft {
    pub dataset: String,
    pub model: String,
    pub phase: Phase,
    pub problem_text: String,
    pub temperature: f64,
    pub topn: u32,
    pub option: EvalOption,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Single(EvaluationRequest),
    Async(EvaluationRequest),
    Batch(BatchEvaluationRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Evaluated(EvaluationResult),
    Started(AsyncSubmission),
    Batch(BatchEvaluationResponse),
}

pub fn sample_problems() -> Vec<Problem> {
    vec![
        Problem::new("add_numbers", "Write a function that adds two numbers"),
        Problem::new("find_max", "Write a function that finds the maximum value in a list"),
        Problem::new("is_palindrome", "Write a function that checks if a string is a palindrome"),
        Problem::new("sort_list", "Write a function that sorts a list of numbers in ascending order"),
        Problem::new("factorial", "Write a function that calculates the factorial of a number"),
    ]
}

#[derive(Debug, Clone)]
pub struct EvaluationForm {
    kind: FormKind,
    pub draft: EvaluationDraft,
    submitting: bool,
    error: Option<String>,
    outcome: Option<Outcome>,
}

impl EvaluationForm {
    pub fn new(kind: FormKind) -> Self {
        Self::with_draft(kind, kind.default_draft())
    }

    pub fn with_draft(kind: FormKind, draft: EvaluationDraft) -> Self {
        Self {
            kind,
            draft,
            submitting: false,
            error: None,
            outcome: None,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn valid_problems(&self) -> Vec<Problem> {
        self.draft
            .problems
            .iter()
            .filter(|p| p.is_complete())
            .cloned()
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        if self.submitting {
            return false;
        }
        if self.kind.uses_problem_list() {
            self.draft.problems.iter().any(Problem::is_complete)
        } else {
            !self.draft.problem_text.trim().is_empty()
        }
    }

    pub fn add_problem(&mut self) {
        self.draft.problems.push(Problem::default());
    }

    /// Removes a problem row. The last remaining row is kept.
    pub fn remove_problem(&mut self, index: usize) -> bool {
        if self.draft.problems.len() > 1 && index < self.draft.problems.len() {
            self.draft.problems.remove(index);
            true
        } else {
            false
        }
    }

    pub fn load_sample_problems(&mut self) {
        self.draft.problems = sample_problems();
    }

    /// Fill the problem text with sample `index` (0-based). False if there is none.
    pub fn use_sample(&mut self, index: usize) -> bool {
        match self.kind.sample_texts().get(index) {
            Some(text) => {
                self.draft.problem_text = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn submit_label(&self) -> String {
        match self.kind {
            FormKind::Single => "Evaluate Problem".to_string(),
            FormKind::Async => "Start Async Evaluation".to_string(),
            FormKind::Batch => format!("Evaluate Batch ({} problems)", self.valid_problems().len()),
        }
    }

    /// Validate the draft and build the request for this form's endpoint.
    pub fn build(&self) -> Result<Submission> {
        let d = &self.draft;
        let temperature = self.kind.shows_temperature().then_some(d.temperature);
        let topn = self.kind.shows_topn().then_some(d.topn);
        let option = self.kind.shows_option().then_some(d.option);

        if self.kind.uses_problem_list() {
            let problems = self.valid_problems();
            if problems.is_empty() {
                return Err(DashboardError::Validation(EMPTY_BATCH.to_string()));
            }
            return Ok(Submission::Batch(BatchEvaluationRequest {
                dataset: d.dataset.clone(),
                model: d.model.clone(),
                phase: d.phase,
                temperature,
                topn,
                option,
                problems,
            }));
        }

        if d.problem_text.trim().is_empty() {
            return Err(DashboardError::Validation(EMPTY_PROBLEM_TEXT.to_string()));
        }
        let request = EvaluationRequest {
            dataset: d.dataset.clone(),
            model: d.model.clone(),
            problem_text: d.problem_text.clone(),
            phase: d.phase,
            temperature,
            topn,
            option,
        };
        Ok(match self.kind {
            FormKind::Async => Submission::Async(request),
            _ => Submission::Single(request),
        })
    }

    /// Run one submit cycle. Prior error and outcome are cleared first; the form is
    /// submittable again once this returns, whatever happened.
    pub async fn submit(&mut self, client: &ApiClient) -> Option<&Outcome> {
        self.submitting = true;
        self.error = None;
        self.outcome = None;

        let result = match self.build() {
            Ok(submission) => {
                log::debug!("📤 Submitting {:?} form to {}", self.kind, self.kind.endpoint());
                dispatch(client, submission).await
            }
            Err(e) => {
                log::debug!("Submission blocked locally: {}", e);
                Err(e)
            }
        };

        match result {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(e) => self.error = Some(e.to_string()),
        }
        self.submitting = false;
        self.outcome.as_ref()
    }

    pub fn render_draft(&self, out: &mut String) {
        let d = &self.draft;
        let _ = writeln!(out, "Endpoint:    POST {}", self.kind.endpoint());
        let _ = writeln!(out, "Dataset:     {}", d.dataset);
        let _ = writeln!(out, "Model:       {}", d.model);
        let _ = writeln!(out, "Phase:       {}", d.phase);
        if self.kind.shows_temperature() {
            let _ = writeln!(out, "Temperature: {}", d.temperature);
        }
        if self.kind.shows_topn() {
            let _ = writeln!(out, "Top N:       {}", d.topn);
        }
        if self.kind.shows_option() {
            let _ = writeln!(out, "Option:      {}", d.option);
        }
        if self.kind.uses_problem_list() {
            let _ = writeln!(out, "Problems ({} ready):", self.valid_problems().len());
            for (i, p) in d.problems.iter().enumerate() {
                let marker = if p.is_complete() { "✓" } else { "✗" };
                let _ = writeln!(out, "  {} {}. {}: {}", marker, i + 1, p.name, p.text);
            }
        } else {
            let _ = writeln!(out, "Problem:\n{}", d.problem_text);
            let samples = self.kind.sample_texts();
            if d.problem_text.trim().is_empty() && !samples.is_empty() {
                let _ = writeln!(out, "Sample problems (--sample N):");
                for (i, text) in samples.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, text);
                }
            }
        }
    }

    /// The submit button, greyed out while submitting or when the draft is incomplete.
    pub fn render_submit(&self, out: &mut String) {
        if self.can_submit() {
            let _ = writeln!(out, "[{}]", self.submit_label());
        } else {
            let _ = writeln!(out, "[{}] (disabled)", self.submit_label());
        }
    }
}

async fn dispatch(client: &ApiClient, submission: Submission) -> Result<Outcome> {
    match submission {
        Submission::Single(request) => client.evaluate(&request).await.map(Outcome::Evaluated),
        Submission::Async(request) => client.evaluate_async(&request).await.map(Outcome::Started),
        Submission::Batch(request) => client.evaluate_batch(&request).await.map(Outcome::Batch),
    }
}
