//! Monotonic merge of push and poll updates into one view

use chrono::{DateTime, Utc};
use eduvid_core::{project_steps, stage_rank, ProgressFrame, Step};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProgressSource, SyncEvent, SyncUpdate, GENERATION_FAILED};

/// Outcome of the current generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

/// Everything a progress display needs
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct GenerationView {
    /// Generation attempts started through this view
    pub attempt: u32,

    pub status: GenerationStatus,

    /// Displayed percent; never decreases within one attempt
    pub percent: f64,

    /// Backend status tag of the current phase
    pub stage: String,

    /// Latest human-readable progress message
    pub message: String,

    /// Whether the progress socket is currently open
    pub connected: bool,

    pub task_id: Option<String>,

    pub video_url: Option<String>,

    pub error: Option<String>,

    pub last_source: Option<ProgressSource>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl GenerationView {
    pub fn steps(&self) -> Vec<Step> {
        project_steps(self.percent, &self.stage)
    }
}

/// Applies [`SyncEvent`]s in arrival order.
///
/// Percent only moves up, the stage tag only moves forward through the phase
/// order, and terminal states absorb later progress.
#[derive(Debug, Default)]
pub struct ProgressReducer {
    view: GenerationView,
}

impl ProgressReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &GenerationView {
        &self.view
    }

    /// Apply one event; returns whether the view changed
    pub fn apply(&mut self, event: &SyncEvent) -> bool {
        let changed = match &event.update {
            SyncUpdate::Starting => {
                self.view = GenerationView {
                    attempt: self.view.attempt + 1,
                    status: GenerationStatus::Generating,
                    connected: self.view.connected,
                    ..GenerationView::default()
                };
                true
            }
            SyncUpdate::Started { task_id } => {
                self.view.task_id = task_id.clone();
                true
            }
            SyncUpdate::StartFailed { error } => {
                self.view.status = GenerationStatus::Failed;
                self.view.error = Some(error.clone());
                true
            }
            SyncUpdate::Connected => self.set_connected(true),
            SyncUpdate::Disconnected => self.set_connected(false),
            SyncUpdate::Frame(frame) => self.apply_frame(frame),
            SyncUpdate::TaskProgress { percent } => self.raise_percent(*percent),
            SyncUpdate::TaskSucceeded { video_url } => self.complete(video_url.clone()),
            SyncUpdate::TaskFailed { error } => self.fail(error.clone()),
        };

        if changed {
            self.view.last_source = Some(event.source);
            self.view.updated_at = Some(event.received_at);
        }
        changed
    }

    fn set_connected(&mut self, connected: bool) -> bool {
        if self.view.connected == connected {
            return false;
        }
        self.view.connected = connected;
        true
    }

    fn raise_percent(&mut self, percent: f64) -> bool {
        if self.view.status.is_terminal() {
            return false;
        }

        let percent = clamp_percent(percent);
        if percent <= self.view.percent {
            return false;
        }

        self.view.percent = percent;
        self.view.status = GenerationStatus::Generating;
        true
    }

    fn apply_frame(&mut self, frame: &ProgressFrame) -> bool {
        if self.view.status.is_terminal() {
            debug!("Ignoring frame after terminal state: {}", frame.status);
            return false;
        }

        // terminal tags end the attempt whatever percent they carry
        match frame.status.as_str() {
            "completed" => {
                self.view.message = frame.message.clone();
                return self.complete(None);
            }
            "failed" => {
                self.view.message = frame.message.clone();
                let error = if frame.message.is_empty() {
                    GENERATION_FAILED.to_string()
                } else {
                    frame.message.clone()
                };
                return self.fail(error);
            }
            _ => {}
        }

        let percent = clamp_percent(frame.progress);
        if percent < self.view.percent {
            debug!(
                "Ignoring stale frame at {}% (showing {}%)",
                percent, self.view.percent
            );
            return false;
        }

        self.view.percent = percent;
        self.view.message = frame.message.clone();
        if !stage_is_behind(&frame.status, &self.view.stage) {
            self.view.stage = frame.status.clone();
        }
        self.view.status = GenerationStatus::Generating;
        true
    }

    fn complete(&mut self, video_url: Option<String>) -> bool {
        match self.view.status {
            GenerationStatus::Completed => {
                // a later poll result may still carry the URL
                if self.view.video_url.is_none() && video_url.is_some() {
                    self.view.video_url = video_url;
                    true
                } else {
                    false
                }
            }
            GenerationStatus::Failed => false,
            _ => {
                self.view.status = GenerationStatus::Completed;
                self.view.percent = 100.0;
                self.view.stage = "completed".to_string();
                self.view.video_url = video_url;
                self.view.error = None;
                true
            }
        }
    }

    fn fail(&mut self, error: String) -> bool {
        if self.view.status.is_terminal() {
            return false;
        }
        self.view.status = GenerationStatus::Failed;
        self.view.stage = "failed".to_string();
        self.view.error = Some(error);
        true
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// A tag outside the phase order never replaces one inside it
fn stage_is_behind(candidate: &str, current: &str) -> bool {
    match (stage_rank(candidate), stage_rank(current)) {
        (Some(new), Some(old)) => new < old,
        (None, Some(_)) => true,
        _ => false,
    }
}
