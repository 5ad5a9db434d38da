//! Fixed generation pipeline phases and the progress-to-steps projection

use serde::{Deserialize, Serialize};

/// One named stage of the backend pipeline, used only for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Analyzing,
    GeneratingScript,
    CreatingVisuals,
    GeneratingAudio,
    ComposingVideo,
    Uploading,
}

impl Phase {
    /// Pipeline order
    pub const ALL: [Phase; 6] = [
        Phase::Analyzing,
        Phase::GeneratingScript,
        Phase::CreatingVisuals,
        Phase::GeneratingAudio,
        Phase::ComposingVideo,
        Phase::Uploading,
    ];

    /// Status tag the backend uses for this phase
    pub fn id(&self) -> &'static str {
        match self {
            Phase::Analyzing => "analyzing",
            Phase::GeneratingScript => "generating_script",
            Phase::CreatingVisuals => "creating_visuals",
            Phase::GeneratingAudio => "generating_audio",
            Phase::ComposingVideo => "composing_video",
            Phase::Uploading => "uploading",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Analyzing => "Analyzing Content",
            Phase::GeneratingScript => "Generating Script",
            Phase::CreatingVisuals => "Creating Visuals",
            Phase::GeneratingAudio => "Generating Audio",
            Phase::ComposingVideo => "Composing Video",
            Phase::Uploading => "Uploading",
        }
    }

    /// Percent range covered by the phase, `(start, end)`
    pub fn range(&self) -> (u8, u8) {
        match self {
            Phase::Analyzing => (0, 20),
            Phase::GeneratingScript => (20, 40),
            Phase::CreatingVisuals => (40, 60),
            Phase::GeneratingAudio => (60, 75),
            Phase::ComposingVideo => (75, 95),
            Phase::Uploading => (95, 100),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Phase> {
        Phase::ALL.into_iter().find(|phase| phase.id() == tag)
    }

    fn ordinal(&self) -> usize {
        Phase::ALL.iter().position(|p| p == self).unwrap_or(0)
    }
}

/// Position of a status tag in the pipeline order.
///
/// Phase tags rank by pipeline position and `completed` ranks after every
/// phase. Tags outside the pipeline (`created`, `processing`, ...) have no rank.
pub fn stage_rank(tag: &str) -> Option<usize> {
    if tag == "completed" {
        return Some(Phase::ALL.len());
    }
    Phase::from_tag(tag).map(|phase| phase.ordinal())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub phase: Phase,
    pub state: StepState,
}

/// Map the current percent and status tag onto the phase list.
///
/// A phase is completed once the percent reaches its upper bound, active when
/// the status tag names it, otherwise pending.
pub fn project_steps(percent: f64, status: &str) -> Vec<Step> {
    Phase::ALL
        .into_iter()
        .map(|phase| {
            let (_, end) = phase.range();
            let state = if percent >= f64::from(end) {
                StepState::Completed
            } else if status == phase.id() {
                StepState::Active
            } else {
                StepState::Pending
            };
            Step { phase, state }
        })
        .collect()
}

/// Rough remaining time shown next to the progress bar
pub fn estimated_minutes_remaining(percent: f64) -> u32 {
    let remaining = (100.0 - percent.clamp(0.0, 100.0)) / 10.0;
    remaining.ceil() as u32
}
