//! Educational Video Client
//!
//! Client library for an educational video generation backend: uploads
//! content, triggers generation and tracks job progress over a WebSocket
//! push channel and a task-status poll loop at the same time.

pub mod api;
pub mod config;
pub mod credentials;
pub mod submit;
pub mod sync;
pub mod view;

// Re-export main types for easy access
pub use crate::api::{ApiClient, ClientError, ClientResult};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::credentials::{CredentialStore, Credentials};
pub use crate::submit::{SubmitGate, Submitter};
pub use crate::sync::{
    ConnectionState, GenerationStatus, GenerationView, ProjectWatch, PushChannel, StatusPoller,
};
pub use eduvid_core::{ContentSubmission, GenerationConfig, Project, Video};
