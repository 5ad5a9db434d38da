//! Eduvid Core - Shared domain types for educational video generation
//!
//! Holds the wire models exchanged with the generation backend, the typed
//! generation configuration, the fixed phase table used for progress display
//! and the client-side submission rules. Nothing in here performs I/O.

pub mod generation;
pub mod models;
pub mod phases;
pub mod validation;

pub use generation::{
    Accent, AnimationStyle, ColorScheme, DurationPreference, EducationLevel, EducationTier,
    GenerationConfig, Pacing, Quality, VideoStyle, VisualTheme, VoiceConfig, VoiceGender,
    VoiceLanguage,
};
pub use models::{
    DownloadLink, GenerateResponse, Project, ProjectStatus, ProgressFrame, TaskState, TaskStatus,
    TokenResponse, UploadResponse, Video,
};
pub use phases::{estimated_minutes_remaining, project_steps, stage_rank, Phase, Step, StepState};
pub use validation::{
    ContentSubmission, ContentType, UploadFileKind, ADVISORY_MAX_UPLOAD_BYTES, MAX_TITLE_CHARS,
    MIN_CONTENT_CHARS,
};

/// Result type for Eduvid Core operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Client-side validation failures; a request is never sent when one is raised
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title and content are required")]
    MissingField,

    #[error("Title must be at most {max} characters (got {len})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Content must be at least {min} characters (got {len})")]
    ContentTooShort { len: usize, min: usize },

    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}
