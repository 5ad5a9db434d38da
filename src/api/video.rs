//! Generation, task status and video endpoints

use async_trait::async_trait;
use eduvid_core::{DownloadLink, GenerateResponse, TaskStatus, Video};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ClientResult;
use super::transport::{segment, Transport};
use crate::sync::{GenerationBackend, TaskStatusSource};

#[derive(Debug, Clone)]
pub struct VideoService {
    transport: Arc<Transport>,
}

impl VideoService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Start a generation job. Repeated calls start repeated jobs; callers
    /// guard against double submission.
    pub async fn generate_video(&self, project_id: u64) -> ClientResult<GenerateResponse> {
        let response: GenerateResponse = self
            .transport
            .post_empty(&format!("video/generate/{}", project_id))
            .await?;

        info!(
            "🎬 Generation started for project {} (task: {})",
            project_id,
            response.task_id.as_deref().unwrap_or("none")
        );
        Ok(response)
    }

    pub async fn task_status(&self, task_id: &str) -> ClientResult<TaskStatus> {
        let status: TaskStatus = self
            .transport
            .get_json(&format!("status/task/{}", segment(task_id)))
            .await?;
        debug!("Task {} is {:?}", task_id, status.status);
        Ok(status)
    }

    pub async fn project_videos(&self, project_id: u64) -> ClientResult<Vec<Video>> {
        self.transport
            .get_json(&format!("video/projects/{}/videos", project_id))
            .await
    }

    pub async fn download_video(&self, video_id: u64) -> ClientResult<DownloadLink> {
        self.transport
            .get_json(&format!("video/{}/download", video_id))
            .await
    }
}

#[async_trait]
impl TaskStatusSource for VideoService {
    async fn task_status(&self, task_id: &str) -> ClientResult<TaskStatus> {
        VideoService::task_status(self, task_id).await
    }
}

#[async_trait]
impl GenerationBackend for VideoService {
    async fn start_generation(&self, project_id: u64) -> ClientResult<GenerateResponse> {
        self.generate_video(project_id).await
    }
}
