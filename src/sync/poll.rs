//! Fixed-interval task status polling

use eduvid_core::TaskState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{EventSender, SyncEvent, SyncUpdate, TaskStatusSource, GENERATION_FAILED};

/// Spawns poll loops against a status source
#[derive(Clone)]
pub struct StatusPoller {
    source: Arc<dyn TaskStatusSource>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn TaskStatusSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `task_id`, reporting into `events`.
    ///
    /// The first request goes out one interval after the call. Each response
    /// is awaited before the next tick, so requests never overlap.
    pub fn spawn(&self, task_id: String, events: EventSender) -> PollHandle {
        let source = self.source.clone();
        let interval = self.interval;
        let label = task_id.clone();

        info!("⏱️ Polling task {} every {}ms", task_id, interval.as_millis());
        let task = tokio::spawn(run_poll_loop(source, task_id, interval, events));

        PollHandle {
            task_id: label,
            task,
        }
    }
}

async fn run_poll_loop(
    source: Arc<dyn TaskStatusSource>,
    task_id: String,
    interval: Duration,
    events: EventSender,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if events.is_closed() {
            debug!("Status consumer gone, stopping poll for {}", task_id);
            break;
        }

        let status = match source.task_status(&task_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Status check error for {}: {}", task_id, e);
                continue;
            }
        };

        let update = match status.status {
            TaskState::Success => SyncUpdate::TaskSucceeded {
                video_url: status.video_url(),
            },
            TaskState::Failure => SyncUpdate::TaskFailed {
                error: status
                    .error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERATION_FAILED.to_string()),
            },
            TaskState::Progress => SyncUpdate::TaskProgress {
                percent: status.percent(),
            },
            other => {
                debug!("Task {} reported {:?}, still waiting", task_id, other);
                continue;
            }
        };

        if events.send(SyncEvent::poll(update)).is_err() {
            debug!("Status consumer gone, stopping poll for {}", task_id);
            break;
        }

        if status.is_terminal() {
            info!("🏁 Task {} finished as {:?}", task_id, status.status);
            break;
        }
    }
}

/// Owns a running poll loop; dropping it cancels the loop
#[derive(Debug)]
pub struct PollHandle {
    task_id: String,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop; no request is issued afterwards
    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!("Stopping poll for {}", self.task_id);
        }
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
