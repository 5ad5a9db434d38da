//! Progress socket adapter
//!
//! One WebSocket per project id. Inbound text frames are decoded into
//! [`ProgressFrame`]s and forwarded; the socket never sends application
//! messages and is never reopened after it drops.

use eduvid_core::ProgressFrame;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::api::transport::segment;

use super::{EventSender, SyncEvent, SyncUpdate};

/// Upper bound on sending the close frame during teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Closed by its owner; terminal
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Opens progress sockets under a WebSocket origin
#[derive(Debug, Clone)]
pub struct PushChannel {
    ws_base_url: String,
}

impl PushChannel {
    pub fn new(ws_base_url: impl Into<String>) -> Self {
        Self {
            ws_base_url: ws_base_url.into(),
        }
    }

    /// Socket URL for one client id
    pub fn endpoint(&self, client_id: &str) -> String {
        format!(
            "{}/ws/{}",
            self.ws_base_url.trim_end_matches('/'),
            segment(client_id)
        )
    }

    /// Connect for `client_id` in the background; no id means no socket
    pub fn open(&self, client_id: Option<&str>, events: EventSender) -> Option<PushHandle> {
        let client_id = client_id.filter(|id| !id.is_empty())?;
        let endpoint = self.endpoint(client_id);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = tokio::spawn(run_push(endpoint.clone(), events, shutdown_rx, state_tx));

        Some(PushHandle {
            endpoint,
            shutdown: Some(shutdown_tx),
            task: Some(task),
            state: state_rx,
        })
    }
}

async fn run_push(
    endpoint: String,
    events: EventSender,
    mut shutdown: oneshot::Receiver<()>,
    state: watch::Sender<ConnectionState>,
) {
    state.send_replace(ConnectionState::Connecting);
    debug!("Connecting progress socket {}", endpoint);

    let connected = tokio::select! {
        result = connect_async(endpoint.as_str()) => result,
        _ = &mut shutdown => {
            state.send_replace(ConnectionState::Closed);
            return;
        }
    };

    let socket = match connected {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!("Progress socket {} failed to connect: {}", endpoint, e);
            state.send_replace(ConnectionState::Disconnected);
            let _ = events.send(SyncEvent::push(SyncUpdate::Disconnected));
            return;
        }
    };

    info!("🔌 Progress socket connected: {}", endpoint);
    state.send_replace(ConnectionState::Connected);
    let _ = events.send(SyncEvent::push(SyncUpdate::Connected));

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let closing = async {
                    sink.send(Message::Close(None)).await?;
                    sink.close().await
                };
                if let Err(e) = tokio::time::timeout(CLOSE_TIMEOUT, closing)
                    .await
                    .unwrap_or(Ok(()))
                {
                    debug!("Close frame not delivered to {}: {}", endpoint, e);
                }
                info!("🔌 Progress socket closed: {}", endpoint);
                state.send_replace(ConnectionState::Closed);
                let _ = events.send(SyncEvent::push(SyncUpdate::Disconnected));
                return;
            }
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(frame) = decode_frame(&text) {
                        if events.send(SyncEvent::push(SyncUpdate::Frame(frame))).is_err() {
                            debug!("Progress consumer gone for {}", endpoint);
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Progress socket closed by server: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Progress socket error on {}: {}", endpoint, e);
                    break;
                }
                None => break,
            }
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    let _ = events.send(SyncEvent::push(SyncUpdate::Disconnected));
}

/// Decode one text frame; anything unparseable is dropped
pub fn decode_frame(text: &str) -> Option<ProgressFrame> {
    match ProgressFrame::parse(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("Dropping malformed progress frame: {}", e);
            None
        }
    }
}

/// Owns one open socket; dropping it sends the close frame
#[derive(Debug)]
pub struct PushHandle {
    endpoint: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<ConnectionState>,
}

impl PushHandle {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Close the socket and wait for the driver to finish
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!("Progress socket driver ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PushHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
