//! Typed generation configuration sent alongside uploaded content

use serde::{Deserialize, Serialize};

use crate::{Result, ValidationError};

/// Complete video configuration attached to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Target audience
    pub education_level: EducationLevel,

    /// Narration voice
    pub voice: VoiceConfig,

    /// Visual presentation
    pub style: VideoStyle,

    /// Output resolution tier
    pub quality: Quality,

    pub duration_preference: DurationPreference,

    /// Burn subtitles into the output
    pub include_subtitles: bool,

    /// Subtitle language code (e.g. "en")
    pub subtitle_language: String,

    pub pacing: Pacing,

    pub include_diagrams: bool,

    pub include_examples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationLevel {
    pub level: EducationTier,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationTier {
    #[serde(rename = "1st")]
    Class1,
    #[serde(rename = "5th")]
    Class5,
    #[serde(rename = "10th")]
    Class10,
    #[serde(rename = "12th")]
    Class12,
    #[serde(rename = "diploma")]
    Diploma,
    #[serde(rename = "engineering")]
    Engineering,
    #[serde(rename = "medical")]
    Medical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub gender: VoiceGender,
    pub language: VoiceLanguage,
    pub accent: Accent,
    /// Speaking rate multiplier, 0.5 to 2.0
    pub speed: f32,
    /// Pitch multiplier, 0.5 to 2.0
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceLanguage {
    #[serde(rename = "en-IN")]
    EnglishIndian,
    #[serde(rename = "hi-IN")]
    Hindi,
    #[serde(rename = "ta-IN")]
    Tamil,
    #[serde(rename = "te-IN")]
    Telugu,
    #[serde(rename = "mr-IN")]
    Marathi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Indian,
    American,
    British,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoStyle {
    pub theme: VisualTheme,
    pub color_scheme: ColorScheme,
    pub animation_style: AnimationStyle,
    pub include_transitions: bool,
    pub background_music: bool,
    /// Background music volume, 0 to 100
    pub music_volume: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualTheme {
    Educational,
    Professional,
    Casual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Blue,
    Green,
    Purple,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    Smooth,
    Minimal,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "1440p")]
    P1440,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreference {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    Slow,
    Medium,
    Fast,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            education_level: EducationLevel::default(),
            voice: VoiceConfig::default(),
            style: VideoStyle::default(),
            quality: Quality::P1080,
            duration_preference: DurationPreference::Medium,
            include_subtitles: true,
            subtitle_language: "en".to_string(),
            pacing: Pacing::Medium,
            include_diagrams: true,
            include_examples: true,
        }
    }
}

impl Default for EducationLevel {
    fn default() -> Self {
        Self {
            level: EducationTier::Class10,
            subject: Some("Mathematics".to_string()),
            topic: None,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            gender: VoiceGender::Female,
            language: VoiceLanguage::EnglishIndian,
            accent: Accent::Indian,
            speed: 1.0,
            pitch: 1.0,
        }
    }
}

impl Default for VideoStyle {
    fn default() -> Self {
        Self {
            theme: VisualTheme::Educational,
            color_scheme: ColorScheme::Blue,
            animation_style: AnimationStyle::Smooth,
            include_transitions: true,
            background_music: false,
            music_volume: 30,
        }
    }
}

const VOICE_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

impl GenerationConfig {
    /// Reject values the backend would refuse before anything is sent
    pub fn validate(&self) -> Result<()> {
        if !VOICE_RANGE.contains(&self.voice.speed) {
            return Err(ValidationError::InvalidConfig(format!(
                "voice speed {} outside 0.5-2.0",
                self.voice.speed
            )));
        }

        if !VOICE_RANGE.contains(&self.voice.pitch) {
            return Err(ValidationError::InvalidConfig(format!(
                "voice pitch {} outside 0.5-2.0",
                self.voice.pitch
            )));
        }

        if self.style.music_volume > 100 {
            return Err(ValidationError::InvalidConfig(format!(
                "music volume {} outside 0-100",
                self.style.music_volume
            )));
        }

        if self.subtitle_language.trim().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "subtitle language must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl VoiceLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceLanguage::EnglishIndian => "en-IN",
            VoiceLanguage::Hindi => "hi-IN",
            VoiceLanguage::Tamil => "ta-IN",
            VoiceLanguage::Telugu => "te-IN",
            VoiceLanguage::Marathi => "mr-IN",
        }
    }
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P1440 => "1440p",
        }
    }
}
