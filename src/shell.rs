// src/shell.rs
//! Route table, page layout and the navigation that mounts and tears down views.

use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::config::DashboardConfig;
use crate::errors::Result;
use crate::models::{EvalOption, Phase, Problem};
use crate::views::form::sample_problems;
use crate::views::{
    ApiInfoView, AsyncEvaluationView, BatchEvaluationView, DashboardView, EvaluationDraft, EvaluationForm,
    FormKind, SingleEvaluationView, View,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Single,
    Async,
    Batch,
    Info,
}

impl Route {
    pub const ALL: [Route; 5] = [Route::Dashboard, Route::Single, Route::Async, Route::Batch, Route::Info];

    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Single => "/single",
            Route::Async => "/async",
            Route::Batch => "/batch",
            Route::Info => "/info",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Single => "Single Evaluation",
            Route::Async => "Async Evaluation",
            Route::Batch => "Batch Evaluation",
            Route::Info => "API Info",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Route::Dashboard => "Service status overview",
            Route::Single => "Test a single coding problem",
            Route::Async => "Start background evaluation task",
            Route::Batch => "Evaluate multiple problems",
            Route::Info => "View available models and datasets",
        }
    }

    /// Exact match on the path; a missing leading slash is tolerated.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim();
        let normalized = if path.starts_with('/') { path.to_string() } else { format!("/{}", path) };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Like `from_path`, but unknown paths land on the dashboard.
    pub fn resolve(path: &str) -> Route {
        Route::from_path(path).unwrap_or_else(|| {
            log::warn!("Unknown route '{}', showing dashboard", path);
            Route::Dashboard
        })
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Route::from_path(s).ok_or_else(|| format!("unknown route '{}'", s))
    }
}

/// Header and navigation around a page body.
pub fn render_layout(active: Route, body: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HumanEvalComm Dashboard");
    let nav: Vec<String> = Route::ALL
        .iter()
        .map(|r| {
            if *r == active {
                format!("[{} {}]", r.path(), r.title())
            } else {
                format!(" {} {} ", r.path(), r.title())
            }
        })
        .collect();
    let _ = writeln!(out, "{}", nav.join(" | "));
    let _ = writeln!(out, "{}\n", "=".repeat(60));
    out.push_str(body);
    out
}

/// Values supplied up front for an evaluation form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftOverrides {
    pub dataset: Option<String>,
    pub model: Option<String>,
    pub phase: Option<Phase>,
    pub temperature: Option<f64>,
    pub topn: Option<u32>,
    pub option: Option<EvalOption>,
    pub problem_text: Option<String>,
    pub problems: Vec<Problem>,
    pub samples: bool,
    /// 1-based quick-fill sample for the single and async forms.
    pub sample: Option<usize>,
}

impl DraftOverrides {
    pub fn apply(&self, draft: &mut EvaluationDraft) {
        if let Some(dataset) = &self.dataset {
            draft.dataset = dataset.clone();
        }
        if let Some(model) = &self.model {
            draft.model = model.clone();
        }
        if let Some(phase) = self.phase {
            draft.phase = phase;
        }
        if let Some(temperature) = self.temperature {
            draft.temperature = temperature;
        }
        if let Some(topn) = self.topn {
            draft.topn = topn;
        }
        if let Some(option) = self.option {
            draft.option = option;
        }
        if let Some(text) = &self.problem_text {
            draft.problem_text = text.clone();
        }
        if self.samples || !self.problems.is_empty() {
            let mut problems = if self.samples { sample_problems() } else { Vec::new() };
            problems.extend(self.problems.iter().cloned());
            draft.problems = problems;
        }
    }

    /// Whether enough was supplied to submit without further input.
    pub fn submits(&self) -> bool {
        self.problem_text.is_some() || !self.problems.is_empty() || self.samples || self.sample.is_some()
    }

    fn form(&self, kind: FormKind) -> EvaluationForm {
        let mut draft = kind.default_draft();
        self.apply(&mut draft);
        let mut form = EvaluationForm::with_draft(kind, draft);
        if let (Some(n), None) = (self.sample, &self.problem_text) {
            if !form.use_sample(n.wrapping_sub(1)) {
                log::warn!("No sample problem {} for the {:?} form", n, kind);
            }
        }
        form
    }
}

/// The mounted view for the current route.
pub enum Page {
    Dashboard(DashboardView),
    Single(SingleEvaluationView),
    Async(AsyncEvaluationView),
    Batch(BatchEvaluationView),
    Info(ApiInfoView),
}

impl Page {
    pub fn view(&self) -> &dyn View {
        match self {
            Page::Dashboard(v) => v,
            Page::Single(v) => v,
            Page::Async(v) => v,
            Page::Batch(v) => v,
            Page::Info(v) => v,
        }
    }

    pub fn view_mut(&mut self) -> &mut dyn View {
        match self {
            Page::Dashboard(v) => v,
            Page::Single(v) => v,
            Page::Async(v) => v,
            Page::Batch(v) => v,
            Page::Info(v) => v,
        }
    }

    pub fn route(&self) -> Route {
        self.view().route()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The task reached a terminal status.
    Finished,
    /// The user left (or shutdown was requested) before the task settled.
    Left,
}

pub struct Shell {
    client: ApiClient,
    config: DashboardConfig,
    current: Option<Page>,
}

impl Shell {
    pub fn new(config: DashboardConfig, client: ApiClient) -> Self {
        Self {
            client,
            config,
            current: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current(&self) -> Option<&Page> {
        self.current.as_ref()
    }

    /// Tear down the current view (if any), then build and mount the one for `route`.
    pub async fn navigate(&mut self, route: Route, overrides: &DraftOverrides) -> &mut Page {
        self.leave();

        let base_url = self.config.base_url.clone();
        let mut page = match route {
            Route::Dashboard => Page::Dashboard(DashboardView::new(base_url)),
            Route::Single => Page::Single(SingleEvaluationView::new(overrides.form(FormKind::Single))),
            Route::Async => Page::Async(AsyncEvaluationView::new(
                overrides.form(FormKind::Async),
                self.client.clone(),
                self.config.poll_interval(),
            )),
            Route::Batch => Page::Batch(BatchEvaluationView::new(overrides.form(FormKind::Batch))),
            Route::Info => Page::Info(ApiInfoView::new(base_url)),
        };

        log::debug!("Mounting {}", route.path());
        page.view_mut().mount(&self.client).await;
        self.current.insert(page)
    }

    /// Drop the current view. Anything it had in flight is abandoned.
    pub fn leave(&mut self) {
        if let Some(page) = self.current.take() {
            log::debug!("Leaving {}", page.route().path());
        }
    }

    pub fn render(&self) -> String {
        match &self.current {
            Some(page) => render_layout(page.route(), &page.view().render()),
            None => render_layout(Route::Dashboard, ""),
        }
    }

    /// Submit the current evaluation form. Returns false for non-form routes or when
    /// the submission did not succeed.
    pub async fn submit_current(&mut self) -> bool {
        match self.current.as_mut() {
            Some(Page::Single(view)) => view.submit(&self.client).await,
            Some(Page::Async(view)) => view.submit(&self.client).await,
            Some(Page::Batch(view)) => view.submit(&self.client).await,
            _ => false,
        }
    }

    /// Follow the current async task until it settles, re-rendering on every update.
    ///
    /// Reads commands line by line from `input`: `r` refreshes, `q` leaves. End of
    /// input just stops reading. Returns `None` when the current page is not polling.
    pub async fn watch_current<R, W>(
        &mut self,
        input: R,
        out: &mut W,
        shutdown: CancellationToken,
    ) -> Result<Option<WatchExit>>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let Some(Page::Async(view)) = self.current.as_mut() else {
            return Ok(None);
        };
        if view.poll_state().task_id.is_none() {
            return Ok(None);
        }

        let mut updates = view.subscribe();
        let mut lines = input.lines();
        let mut reading = true;

        writeln!(out, "Commands: r = refresh, q = leave")?;
        loop {
            if view.is_finished() {
                return Ok(Some(WatchExit::Finished));
            }

            tokio::select! {
                _ = shutdown.cancelled() => return Ok(Some(WatchExit::Left)),
                changed = updates.changed() => {
                    if changed.is_err() {
                        return Ok(Some(WatchExit::Left));
                    }
                    writeln!(out, "{}", render_layout(Route::Async, &view.render()))?;
                }
                line = lines.next_line(), if reading => match line {
                    Ok(Some(command)) => match command.trim() {
                        "r" | "refresh" => {
                            view.refresh().await;
                            writeln!(out, "{}", render_layout(Route::Async, &view.render()))?;
                        }
                        "q" | "quit" => return Ok(Some(WatchExit::Left)),
                        "" => {}
                        other => writeln!(out, "Unknown command '{}'", other)?,
                    },
                    Ok(None) => reading = false,
                    Err(e) => {
                        log::warn!("Stopped reading commands: {}", e);
                        reading = false;
                    }
                },
            }
        }
    }
}
