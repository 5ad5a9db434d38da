//! API module for the generation backend
//!
//! Typed clients for the REST endpoints under `/api/v1`, sharing one
//! transport and one credential context.

use std::sync::Arc;
use tracing::info;

use crate::config::ApiConfig;
use crate::credentials::Credentials;

pub mod auth;
pub mod content;
pub mod error;
pub mod transport;
pub mod video;

pub use auth::AuthService;
pub use content::ContentService;
pub use error::{ClientError, ClientResult};
pub use transport::Transport;
pub use video::VideoService;

/// Entry point bundling every domain client
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<Transport>,
    content: ContentService,
    video: Arc<VideoService>,
    auth: AuthService,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig, credentials: Credentials) -> ClientResult<Self> {
        let transport = Arc::new(Transport::new(&config.api_root(), credentials)?);

        info!(
            "🔗 API client ready for {} (authenticated: {})",
            transport.base_url(),
            transport.credentials().is_authenticated()
        );

        Ok(Self {
            content: ContentService::new(transport.clone()),
            video: Arc::new(VideoService::new(transport.clone())),
            auth: AuthService::new(transport.clone()),
            transport,
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn video(&self) -> &VideoService {
        &self.video
    }

    /// Shared handle for the sync layer
    pub fn video_handle(&self) -> Arc<VideoService> {
        self.video.clone()
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
