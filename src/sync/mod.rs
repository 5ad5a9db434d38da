//! Generation status synchronisation
//!
//! Two independent observers report on one backend job: the progress socket
//! (push) and the task-status poll loop (poll). Both feed a single event
//! stream; one reducer task owns the resulting [`GenerationView`] and publishes
//! snapshots. A [`ProjectWatch`] owns the whole arrangement and tears it down
//! when dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eduvid_core::{GenerateResponse, ProgressFrame, TaskStatus};
use serde::{Deserialize, Serialize};

use crate::api::ClientResult;

pub mod poll;
pub mod push;
pub mod reducer;
pub mod watch;

pub use poll::{PollHandle, StatusPoller};
pub use push::{ConnectionState, PushChannel, PushHandle};
pub use reducer::{GenerationStatus, GenerationView, ProgressReducer};
pub use watch::ProjectWatch;

/// Fallback message when the tracker reports failure without one
pub const GENERATION_FAILED: &str = "Generation failed";

/// Fallback message when the generation request itself fails
pub const START_FAILED: &str = "Failed to start generation";

/// Anything that can report a task status snapshot
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task_id: &str) -> ClientResult<TaskStatus>;
}

/// Backend operations a project watch needs
#[async_trait]
pub trait GenerationBackend: TaskStatusSource {
    async fn start_generation(&self, project_id: u64) -> ClientResult<GenerateResponse>;
}

/// Where an update came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressSource {
    Push,
    Poll,
    /// Actions taken by the watch itself
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncUpdate {
    /// A generation request is about to be sent
    Starting,
    /// The backend accepted the request
    Started { task_id: Option<String> },
    /// The generation request failed
    StartFailed { error: String },
    Connected,
    Disconnected,
    Frame(ProgressFrame),
    TaskProgress { percent: f64 },
    TaskSucceeded { video_url: Option<String> },
    TaskFailed { error: String },
}

/// One update tagged with its source and arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub source: ProgressSource,
    pub received_at: DateTime<Utc>,
    pub update: SyncUpdate,
}

impl SyncEvent {
    pub fn new(source: ProgressSource, update: SyncUpdate) -> Self {
        Self {
            source,
            received_at: Utc::now(),
            update,
        }
    }

    pub fn push(update: SyncUpdate) -> Self {
        Self::new(ProgressSource::Push, update)
    }

    pub fn poll(update: SyncUpdate) -> Self {
        Self::new(ProgressSource::Poll, update)
    }

    pub fn local(update: SyncUpdate) -> Self {
        Self::new(ProgressSource::Local, update)
    }
}

/// Sender half of the merged event stream
pub type EventSender = tokio::sync::mpsc::UnboundedSender<SyncEvent>;
