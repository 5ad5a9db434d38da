//! Terminal rendering for projects, videos and generation progress

use eduvid_core::{estimated_minutes_remaining, Project, StepState, Video};
use std::fmt::Write;

use crate::sync::{GenerationStatus, GenerationView};

const BAR_WIDTH: usize = 30;

/// Fixed-width progress bar, e.g. `[#########.....]`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Full progress panel for one generation attempt
pub fn render_progress(view: &GenerationView) -> String {
    let mut out = String::new();

    let connection = if view.connected {
        "🟢 Live updates connected"
    } else {
        "⚪ Live updates offline"
    };
    let _ = writeln!(out, "{}", connection);

    if !view.message.is_empty() {
        let _ = writeln!(out, "{}", view.message);
    }

    let _ = writeln!(
        out,
        "{} {:.0}%",
        progress_bar(view.percent, BAR_WIDTH),
        view.percent
    );

    for step in view.steps() {
        let icon = match step.state {
            StepState::Completed => "✅",
            StepState::Active => "🔄",
            StepState::Pending => "⏳",
        };
        let _ = writeln!(out, "  {} {}", icon, step.phase.label());
    }

    match view.status {
        GenerationStatus::Completed => {
            let _ = write!(out, "🎉 Video ready");
            if let Some(url) = &view.video_url {
                let _ = write!(out, ": {}", url);
            }
            out.push('\n');
        }
        GenerationStatus::Failed => {
            let _ = writeln!(
                out,
                "❌ {}",
                view.error.as_deref().unwrap_or("Generation failed")
            );
        }
        GenerationStatus::Generating => {
            let _ = writeln!(
                out,
                "⏱️ Estimated time remaining: ~{} minutes",
                estimated_minutes_remaining(view.percent)
            );
        }
        GenerationStatus::Idle => {}
    }

    out
}

/// Single-line summary used by progress updates in the CLI
pub fn render_progress_line(view: &GenerationView) -> String {
    let stage = if view.stage.is_empty() { "waiting" } else { view.stage.as_str() };
    format!(
        "{} {:>3.0}% {}",
        progress_bar(view.percent, BAR_WIDTH),
        view.percent,
        if view.message.is_empty() { stage } else { view.message.as_str() }
    )
}

pub fn render_project(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📄 #{} {}", project.id, project.title);
    let _ = writeln!(out, "   Status: {}", project.status.as_str());

    if let Some(progress) = project.progress {
        let _ = writeln!(out, "   Progress: {:.0}%", progress);
    }
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "   Description: {}", description);
    }
    if let Some(created_at) = project.created_at {
        let _ = writeln!(out, "   Created: {}", created_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(config) = &project.config {
        let _ = writeln!(
            out,
            "   Config: {} / {} / {}",
            config.quality.as_str(),
            config.education_level.subject.as_deref().unwrap_or("General"),
            config.voice.language.as_str()
        );
    }

    out
}

pub fn render_videos(videos: &[Video]) -> String {
    if videos.is_empty() {
        return "No videos yet\n".to_string();
    }

    let mut out = String::new();
    for video in videos {
        let _ = writeln!(
            out,
            "🎬 #{} {} [{}] {} · {} views · {} downloads",
            video.id,
            video.title.as_deref().unwrap_or("Untitled"),
            if video.status.is_empty() { "unknown" } else { video.status.as_str() },
            video.duration.map(format_duration).unwrap_or_else(|| "--:--".to_string()),
            video.views,
            video.downloads
        );
        if let Some(url) = &video.file_url {
            let _ = writeln!(out, "   {}", url);
        }
    }
    out
}

/// Seconds as m:ss
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
