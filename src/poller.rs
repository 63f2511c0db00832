// src/poller.rs
//! Fixed-interval status polling for one asynchronous evaluation at a time.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::errors::Result;
use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollState {
    pub phase: PollPhase,
    pub task_id: Option<String>,
    /// Latest snapshot from either a scheduled poll or a manual refresh.
    pub snapshot: Option<Task>,
    /// Scheduled fetches completed for the current task, successful or not.
    pub fetches: u32,
}

/// Owns the poll loop for the task it was last started on.
///
/// Dropping the poller cancels the loop. A fetch already on the wire is allowed to
/// finish but its result is discarded.
pub struct TaskPoller {
    client: ApiClient,
    period: Duration,
    state: Arc<watch::Sender<PollState>>,
    cancel: Option<CancellationToken>,
}

impl TaskPoller {
    pub fn new(client: ApiClient, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(PollState::default());
        Self {
            client,
            period,
            state: Arc::new(tx),
            cancel: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> PollPhase {
        self.state.borrow().phase
    }

    /// Begin polling `task_id`, replacing whatever was being polled before.
    ///
    /// The first fetch happens one interval after this call.
    pub fn start(&mut self, task_id: impl Into<String>) {
        let task_id = task_id.into();
        self.stop_loop();

        self.state.send_modify(|s| {
            *s = PollState {
                phase: PollPhase::Polling,
                task_id: Some(task_id.clone()),
                snapshot: None,
                fetches: 0,
            };
        });

        let token = CancellationToken::new();
        log::info!("⏱️  Polling task {} every {}ms", task_id, self.period.as_millis());
        tokio::spawn(poll_loop(
            self.client.clone(),
            task_id,
            self.period,
            self.state.clone(),
            token.clone(),
        ));
        self.cancel = Some(token);
    }

    /// One out-of-band fetch. Updates the snapshot only; the phase and the
    /// schedule are left alone. Returns `Ok(None)` when nothing was started.
    pub async fn refresh(&self) -> Result<Option<Task>> {
        let Some(task_id) = self.state.borrow().task_id.clone() else {
            return Ok(None);
        };

        let task = self.client.get_task_status(&task_id).await?;
        self.state.send_if_modified(|s| {
            if s.task_id.as_deref() == Some(task_id.as_str()) {
                s.snapshot = Some(task.clone());
                true
            } else {
                false
            }
        });
        Ok(Some(task))
    }

    /// Stop polling. A poller that was mid-flight drops back to `Idle`.
    pub fn cancel(&mut self) {
        if self.stop_loop() {
            self.state.send_if_modified(|s| {
                if s.phase == PollPhase::Polling {
                    s.phase = PollPhase::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }

    /// Stop polling and forget the task and its last snapshot.
    pub fn reset(&mut self) {
        self.stop_loop();
        self.state.send_if_modified(|s| {
            if *s == PollState::default() {
                return false;
            }
            *s = PollState::default();
            true
        });
    }

    fn stop_loop(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for TaskPoller {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            log::debug!("Poller dropped, cancelling loop");
            token.cancel();
        }
    }
}

async fn poll_loop(
    client: ApiClient,
    task_id: String,
    period: Duration,
    state: Arc<watch::Sender<PollState>>,
    cancel: CancellationToken,
) {
    // Fetches are serialized: a slow fetch delays the next tick instead of overlapping it.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("Polling for task {} cancelled", task_id);
                return;
            }
            _ = ticker.tick() => {}
        }

        let fetched = client.get_task_status(&task_id).await;
        if cancel.is_cancelled() {
            return;
        }

        let terminal = matches!(&fetched, Ok(task) if task.status.is_terminal());
        state.send_if_modified(|s| {
            if s.task_id.as_deref() != Some(task_id.as_str()) {
                return false;
            }
            s.fetches += 1;
            if let Ok(task) = &fetched {
                s.snapshot = Some(task.clone());
            }
            if terminal {
                s.phase = PollPhase::Terminal;
            }
            true
        });

        match fetched {
            Ok(task) if terminal => {
                log::info!("🏁 Task {} finished with status {}", task_id, task.status);
                return;
            }
            Ok(task) => log::debug!("Task {} is {}", task_id, task.status),
            Err(e) => log::warn!("⚠️  Error polling task status for {}: {}", task_id, e),
        }
    }
}
