//! Wire models for the generation backend

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::generation::GenerationConfig;

/// Project lifecycle as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Created,
    Processing,
    Analyzing,
    GeneratingScript,
    CreatingVisuals,
    GeneratingAudio,
    ComposingVideo,
    Uploading,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Created => "created",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Analyzing => "analyzing",
            ProjectStatus::GeneratingScript => "generating_script",
            ProjectStatus::CreatingVisuals => "creating_visuals",
            ProjectStatus::GeneratingAudio => "generating_audio",
            ProjectStatus::ComposingVideo => "composing_video",
            ProjectStatus::Uploading => "uploading",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
            ProjectStatus::Unknown => "unknown",
        }
    }
}

/// A unit of educational content awaiting or undergoing generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Source text; omitted by some listing endpoints
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub status: ProjectStatus,

    /// Server-side progress percentage, when tracked
    #[serde(default)]
    pub progress: Option<f64>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    /// Stored generation options; `None` when the server's copy is not
    /// representable as a [`GenerationConfig`]
    #[serde(default, deserialize_with = "lenient_config")]
    pub config: Option<GenerationConfig>,
}

/// A generated video belonging to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: u64,

    pub project_id: u64,

    #[serde(default)]
    pub title: Option<String>,

    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    /// Playable file location
    #[serde(default)]
    pub file_url: Option<String>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub quality: Option<String>,

    #[serde(default)]
    pub views: u64,

    #[serde(default)]
    pub downloads: u64,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Job tracker state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    Failure,
    /// STARTED, RETRY, REVOKED and anything else the tracker reports
    #[serde(other)]
    Other,
}

/// Snapshot of one backend generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: TaskState,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
}

impl TaskStatus {
    /// Reported percent; 0 when the tracker carries none
    pub fn percent(&self) -> f64 {
        match &self.progress {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::Object(map)) => map
                .get("percent")
                .and_then(|p| p.as_f64())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Video URL carried by a successful result, if any
    pub fn video_url(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|r| r.get("video_url"))
            .and_then(|u| u.as_str())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskState::Success | TaskState::Failure)
    }
}

/// One message pushed over the progress socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressFrame {
    pub progress: f64,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ProgressFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Sender timestamp, when it is in a recognised format
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Response to a content or file upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub project_id: u64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

/// Response to a generation trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub message: String,
    /// Absent when the backend runs the job without a task tracker
    #[serde(default)]
    pub task_id: Option<String>,
    pub project_id: u64,
    #[serde(default)]
    pub websocket_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLink {
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Parse RFC 3339 or naive ISO-8601 timestamps; naive values are read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// The backend keeps config as free-form JSON; a value outside the typed
/// options drops the config rather than the whole project
fn lenient_config<'de, D>(deserializer: D) -> Result<Option<GenerationConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}
