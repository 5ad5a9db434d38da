//! Content upload and project endpoints

use eduvid_core::{
    ContentSubmission, Project, UploadFileKind, UploadResponse, ADVISORY_MAX_UPLOAD_BYTES,
};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ClientResult;
use super::transport::Transport;

#[derive(Debug, Clone)]
pub struct ContentService {
    transport: Arc<Transport>,
}

impl ContentService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Create a project from text content.
    ///
    /// The submission is validated first; an invalid one never reaches the network.
    pub async fn upload_content(&self, submission: &ContentSubmission) -> ClientResult<UploadResponse> {
        submission.validate()?;

        let response: UploadResponse = self
            .transport
            .post_json("content/upload", submission)
            .await?;

        info!("📤 Uploaded \"{}\" as project {}", submission.title, response.project_id);
        Ok(response)
    }

    /// Create a project from a document, sent as a single multipart part named `file`
    pub async fn upload_file(&self, path: &Path) -> ClientResult<UploadResponse> {
        let kind = UploadFileKind::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;

        if bytes.len() as u64 > ADVISORY_MAX_UPLOAD_BYTES {
            warn!(
                "{} is {} bytes, above the advertised {} byte limit; sending anyway",
                path.display(),
                bytes.len(),
                ADVISORY_MAX_UPLOAD_BYTES
            );
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(kind.mime_type())?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .transport
            .post_multipart("content/upload-file", form)
            .await?;

        info!("📤 Uploaded file {} as project {}", file_name, response.project_id);
        Ok(response)
    }

    pub async fn projects(&self) -> ClientResult<Vec<Project>> {
        self.transport.get_json("content/projects").await
    }

    pub async fn project(&self, project_id: u64) -> ClientResult<Project> {
        self.transport
            .get_json(&format!("content/projects/{}", project_id))
            .await
    }

    pub async fn delete_project(&self, project_id: u64) -> ClientResult<serde_json::Value> {
        let response = self
            .transport
            .delete_json(&format!("content/projects/{}", project_id))
            .await?;
        info!("🗑️ Deleted project {}", project_id);
        Ok(response)
    }
}
