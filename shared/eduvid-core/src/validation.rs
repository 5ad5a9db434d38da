//! Client-side submission rules

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::generation::GenerationConfig;
use crate::{Result, ValidationError};

/// Minimum number of characters of source content
pub const MIN_CONTENT_CHARS: usize = 50;

/// Maximum title length accepted by the backend
pub const MAX_TITLE_CHARS: usize = 255;

/// Upload size shown to users; informational, never enforced
pub const ADVISORY_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Url,
    File,
}

/// Body of a text content upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSubmission {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    pub content_type: ContentType,
    pub config: GenerationConfig,
}

impl ContentSubmission {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            content: content.into(),
            content_type: ContentType::Text,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Check everything that can be checked without the backend
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(ValidationError::MissingField);
        }

        let title_len = self.title.chars().count();
        if title_len > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                len: title_len,
                max: MAX_TITLE_CHARS,
            });
        }

        let content_len = self.content.chars().count();
        if content_len < MIN_CONTENT_CHARS {
            return Err(ValidationError::ContentTooShort {
                len: content_len,
                min: MIN_CONTENT_CHARS,
            });
        }

        self.config.validate()
    }
}

/// Document formats accepted for file upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFileKind {
    Pdf,
    Docx,
    Txt,
}

impl UploadFileKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(UploadFileKind::Pdf),
            "docx" => Ok(UploadFileKind::Docx),
            "txt" => Ok(UploadFileKind::Txt),
            _ => Err(ValidationError::UnsupportedFile(path.display().to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            UploadFileKind::Pdf => "application/pdf",
            UploadFileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            UploadFileKind::Txt => "text/plain",
        }
    }
}
