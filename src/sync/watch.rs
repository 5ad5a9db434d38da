//! Owning scope for one project's generation tracking

use eduvid_core::GenerateResponse;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    ConnectionState, EventSender, GenerationBackend, GenerationView, PollHandle, ProgressReducer,
    PushChannel, PushHandle, StatusPoller, SyncEvent, SyncUpdate, TaskStatusSource, START_FAILED,
};
use crate::api::{ClientError, ClientResult};
use crate::config::SyncConfig;
use crate::submit::SubmitGate;

/// Tracks generation for one project.
///
/// Owns the progress socket, the poll loop and the reducer task. Dropping
/// the watch stops polling, closes the socket and ends the reducer.
pub struct ProjectWatch {
    project_id: u64,
    backend: Arc<dyn GenerationBackend>,
    poller: Option<StatusPoller>,
    events: EventSender,
    view: watch::Receiver<GenerationView>,
    reducer: JoinHandle<()>,
    push: Option<PushHandle>,
    poll: Mutex<Option<PollHandle>>,
    gate: SubmitGate,
    attempts: AtomicU32,
}

impl ProjectWatch {
    /// Start watching `project_id`. Must be called inside a tokio runtime.
    pub fn open<B>(
        project_id: u64,
        backend: Arc<B>,
        push_channel: Option<&PushChannel>,
        settings: &SyncConfig,
    ) -> Self
    where
        B: GenerationBackend + 'static,
    {
        let (events, rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(GenerationView::default());
        let reducer = tokio::spawn(run_reducer(rx, view_tx));

        let push = if settings.enable_push {
            let client_id = project_id.to_string();
            push_channel.and_then(|channel| channel.open(Some(&client_id), events.clone()))
        } else {
            None
        };

        let poller = settings.enable_poll.then(|| {
            let source: Arc<dyn TaskStatusSource> = backend.clone();
            StatusPoller::new(source, settings.poll_interval())
        });

        info!(
            "👀 Watching project {} (push: {}, poll: {})",
            project_id,
            push.is_some(),
            poller.is_some()
        );

        Self {
            project_id,
            backend,
            poller,
            events,
            view,
            reducer,
            push,
            poll: Mutex::new(None),
            gate: SubmitGate::new(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    /// Ask the backend to generate a video and start tracking the task.
    ///
    /// A second call while the first request is outstanding fails with
    /// [`ClientError::Busy`] and sends nothing.
    pub async fn generate(&self) -> ClientResult<GenerateResponse> {
        let _permit = self.gate.acquire()?;

        self.stop_polling();
        self.attempts.fetch_add(1, Ordering::AcqRel);
        self.emit(SyncUpdate::Starting);

        let response = match self.backend.start_generation(self.project_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Generation request for project {} failed: {}", self.project_id, e);
                let error = match &e {
                    ClientError::Http { message, .. } if !message.is_empty() => message.clone(),
                    _ => START_FAILED.to_string(),
                };
                self.emit(SyncUpdate::StartFailed { error });
                return Err(e);
            }
        };

        self.emit(SyncUpdate::Started {
            task_id: response.task_id.clone(),
        });

        match (&response.task_id, &self.poller) {
            (Some(task_id), Some(poller)) => {
                let handle = poller.spawn(task_id.clone(), self.events.clone());
                self.replace_poll(Some(handle));
            }
            (None, _) => debug!("No task id for project {}, relying on push frames", self.project_id),
            (_, None) => debug!("Polling disabled for project {}", self.project_id),
        }

        Ok(response)
    }

    /// Latest view snapshot
    pub fn view(&self) -> GenerationView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change
    pub fn subscribe(&self) -> watch::Receiver<GenerationView> {
        self.view.clone()
    }

    /// Wait until the latest attempt completes or fails
    pub async fn wait_for_terminal(&self) -> GenerationView {
        let attempt = self.attempts.load(Ordering::Acquire);
        let mut view = self.view.clone();

        let result = view
            .wait_for(|v| v.attempt >= attempt && v.status.is_terminal())
            .await
            .map(|v| v.clone());

        match result {
            Ok(view) => view,
            Err(_) => self.view(),
        }
    }

    pub fn push_state(&self) -> Option<ConnectionState> {
        self.push.as_ref().map(PushHandle::state)
    }

    pub fn is_polling(&self) -> bool {
        self.poll_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop polling, close the socket and wait for it to finish closing
    pub async fn close(mut self) {
        self.stop_polling();
        if let Some(push) = self.push.take() {
            push.close().await;
        }
        self.reducer.abort();
        info!("👋 Stopped watching project {}", self.project_id);
    }

    fn emit(&self, update: SyncUpdate) {
        if self.events.send(SyncEvent::local(update)).is_err() {
            debug!("Reducer for project {} has stopped", self.project_id);
        }
    }

    fn stop_polling(&self) {
        self.replace_poll(None);
    }

    fn replace_poll(&self, handle: Option<PollHandle>) {
        let previous = std::mem::replace(&mut *self.poll_slot(), handle);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    fn poll_slot(&self) -> std::sync::MutexGuard<'_, Option<PollHandle>> {
        self.poll.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ProjectWatch {
    fn drop(&mut self) {
        self.stop_polling();
        // dropping the handle sends the close frame
        self.push.take();
        self.reducer.abort();
    }
}

async fn run_reducer(
    mut events: mpsc::UnboundedReceiver<SyncEvent>,
    view: watch::Sender<GenerationView>,
) {
    let mut reducer = ProgressReducer::new();
    while let Some(event) = events.recv().await {
        debug!("{:?} update: {:?}", event.source, event.update);
        if reducer.apply(&event) {
            view.send_replace(reducer.view().clone());
        }
    }
}
