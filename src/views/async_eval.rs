// src/views/async_eval.rs

use async_trait::async_trait;
use std::fmt::Write;
use std::time::Duration;
use tokio::sync::watch;

use super::form::{EvaluationForm, FormKind, Outcome};
use super::{Catalog, LoadState, View, error_panel, heading, render_catalog_choices, render_result};
use crate::client::ApiClient;
use crate::models::{TaskStatus, display_timestamp};
use crate::poller::{PollPhase, PollState, TaskPoller};
use crate::shell::Route;

/// Submits a background evaluation and follows it until it settles.
///
/// The view owns its poller, so tearing the view down stops polling.
pub struct AsyncEvaluationView {
    pub catalog: LoadState<Catalog>,
    pub form: EvaluationForm,
    poller: TaskPoller,
}

impl AsyncEvaluationView {
    pub fn new(form: EvaluationForm, client: ApiClient, poll_interval: Duration) -> Self {
        debug_assert_eq!(form.kind(), FormKind::Async);
        Self {
            catalog: LoadState::Loading,
            form,
            poller: TaskPoller::new(client, poll_interval),
        }
    }

    /// Submit the draft; on success the returned task id seeds the poller.
    ///
    /// Any previous task is dropped first, whether or not this submit succeeds.
    pub async fn submit(&mut self, client: &ApiClient) -> bool {
        self.poller.reset();
        let task_id = match self.form.submit(client).await {
            Some(Outcome::Started(submission)) => submission.task_id.clone(),
            _ => return false,
        };
        log::info!("🆔 Started async evaluation task {}", task_id);
        self.poller.start(task_id);
        true
    }

    /// Manual status check. Errors land in the form's error slot.
    pub async fn refresh(&mut self) {
        if let Err(e) = self.poller.refresh().await {
            self.form.set_error(e.to_string());
        }
    }

    pub fn poll_state(&self) -> PollState {
        self.poller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.poller.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.poller.phase() == PollPhase::Terminal
    }

    fn render_task(&self, out: &mut String, state: &PollState) {
        let Some(task_id) = &state.task_id else {
            return;
        };
        let _ = writeln!(out, "Task ID: {}", task_id);
        match state.phase {
            PollPhase::Polling => {
                let _ = writeln!(out, "🔄 Polling for updates...");
            }
            PollPhase::Terminal => {
                let _ = writeln!(out, "🏁 Task finished");
            }
            PollPhase::Idle => {}
        }

        let Some(task) = &state.snapshot else {
            let _ = writeln!(out, "Status:  waiting for first update");
            return;
        };
        let icon = match task.status {
            TaskStatus::Pending => "🕒",
            TaskStatus::Running => "⏳",
            TaskStatus::Completed => "✅",
            TaskStatus::Failed => "❌",
        };
        let _ = writeln!(out, "Status:  {} {}", icon, task.status);
        if !task.created_at.is_empty() {
            let _ = writeln!(out, "Created:   {}", display_timestamp(&task.created_at));
        }
        if let Some(started) = &task.started_at {
            let _ = writeln!(out, "Started:   {}", display_timestamp(started));
        }
        if let Some(completed) = &task.completed_at {
            let _ = writeln!(out, "Completed: {}", display_timestamp(completed));
        }
        if let Some(error) = &task.error {
            error_panel(out, "Task Error", error);
        }
        if let Some(result) = &task.result {
            let _ = writeln!(out);
            render_result(out, result);
        }
    }
}

#[async_trait]
impl View for AsyncEvaluationView {
    fn route(&self) -> Route {
        Route::Async
    }

    async fn mount(&mut self, client: &ApiClient) {
        self.catalog = Catalog::load(client).await;
    }

    fn render(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Async Evaluation");
        let _ = writeln!(out, "Start a background evaluation and monitor its progress.\n");
        render_catalog_choices(&mut out, &self.catalog, &self.form.draft);
        let _ = writeln!(out);
        self.form.render_draft(&mut out);
        self.form.render_submit(&mut out);
        let _ = writeln!(out);

        if self.form.is_submitting() {
            let _ = writeln!(out, "⏳ Starting task...");
        }
        if let Some(error) = self.form.error() {
            error_panel(&mut out, "Error", error);
        }

        let state = self.poller.state();
        if state.task_id.is_some() {
            self.render_task(&mut out, &state);
        } else if self.form.error().is_none() {
            let _ = writeln!(out, "Submit a problem to start a background task.");
        }
        out
    }
}
