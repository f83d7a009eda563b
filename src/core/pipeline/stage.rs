//! Pipeline stage classification.
//!
//! Stage transitions are asserted by the external production jobs; this
//! core is a passive observer of the persisted `status` string. Everything
//! that interprets a stage goes through [`classify`], so a new stage added
//! by the production system needs exactly one change point here — and until
//! that change lands, unknown values degrade to a neutral "status
//! unavailable" view instead of failing.

use serde::{Deserialize, Serialize};

// ============================================================================
// Stages
// ============================================================================

/// Coarse pipeline position, strictly ordered for the common path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GeneratingContent,
    AnimatingImages,
    ConcatenatingVideos,
    AddingAudio,
    AddingCaption,
    VideoComplete,
    VideoScheduled,
    VideoPublished,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneratingContent => "generating_content",
            Self::AnimatingImages => "animating_images",
            Self::ConcatenatingVideos => "concatenating_videos",
            Self::AddingAudio => "adding_audio",
            Self::AddingCaption => "adding_caption",
            Self::VideoComplete => "video_complete",
            Self::VideoScheduled => "video_scheduled",
            Self::VideoPublished => "video_published",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "generating_content" => Self::GeneratingContent,
            "animating_images" => Self::AnimatingImages,
            "concatenating_videos" => Self::ConcatenatingVideos,
            "adding_audio" => Self::AddingAudio,
            "adding_caption" => Self::AddingCaption,
            "video_complete" => Self::VideoComplete,
            "video_scheduled" => Self::VideoScheduled,
            "video_published" => Self::VideoPublished,
            _ => return None,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::GeneratingContent => "Generating content",
            Self::AnimatingImages => "Animating images",
            Self::ConcatenatingVideos => "Assembling video",
            Self::AddingAudio => "Adding audio",
            Self::AddingCaption => "Adding captions",
            Self::VideoComplete => "Video ready",
            Self::VideoScheduled => "Scheduled",
            Self::VideoPublished => "Published",
        }
    }

    /// Every stage up to and including captioning is externally in flight.
    fn is_processing(&self) -> bool {
        !matches!(
            self,
            Self::VideoComplete | Self::VideoScheduled | Self::VideoPublished
        )
    }
}

/// Finer-grained progress within `generating_content`. Informational only:
/// it feeds a more specific progress label and must never gate actions
/// (the one sanctioned exception is the script-edit check, which keys on
/// the raw `script_generated` value).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubStage {
    GeneratingScript,
    ScriptGenerated,
    GeneratingAudio,
    AudioGenerated,
    GeneratingImages,
    ImagesGenerated,
    ContentGenerated,
}

impl SubStage {
    pub const SCRIPT_GENERATED: &'static str = "script_generated";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneratingScript => "generating_script",
            Self::ScriptGenerated => "script_generated",
            Self::GeneratingAudio => "generating_audio",
            Self::AudioGenerated => "audio_generated",
            Self::GeneratingImages => "generating_images",
            Self::ImagesGenerated => "images_generated",
            Self::ContentGenerated => "content_generated",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "generating_script" => Self::GeneratingScript,
            "script_generated" => Self::ScriptGenerated,
            "generating_audio" => Self::GeneratingAudio,
            "audio_generated" => Self::AudioGenerated,
            "generating_images" => Self::GeneratingImages,
            "images_generated" => Self::ImagesGenerated,
            "content_generated" => Self::ContentGenerated,
            _ => return None,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::GeneratingScript => "Writing script",
            Self::ScriptGenerated => "Script ready",
            Self::GeneratingAudio => "Generating narration",
            Self::AudioGenerated => "Narration ready",
            Self::GeneratingImages => "Generating images",
            Self::ImagesGenerated => "Images ready",
            Self::ContentGenerated => "Content ready",
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Rendering hint for the stage badge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IconHint {
    Spinner,
    Check,
    Calendar,
    Globe,
    Unknown,
}

/// Actions the UI may offer for an item in a given stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    SchedulePublication,
    PlayVideo,
    CancelSchedule,
    OpenPublished,
}

/// Read-only view of one status value: everything the presentation layer
/// needs to render a pipeline row.
#[derive(Debug, Clone, Serialize)]
pub struct StageView {
    /// The status string exactly as persisted.
    pub raw: String,
    pub stage: Option<Stage>,
    pub sub_stage: Option<SubStage>,
    pub is_processing: bool,
    pub label: &'static str,
    pub sub_label: Option<&'static str>,
    pub icon: IconHint,
    pub actions: Vec<ItemAction>,
}

/// Classify a persisted status value. Never fails: values this build does
/// not recognize come back as a neutral, non-processing "status
/// unavailable" view.
pub fn classify(raw: &str) -> StageView {
    if let Some(sub) = SubStage::parse(raw) {
        // Sub-stage values are positions inside content generation.
        return StageView {
            raw: raw.to_string(),
            stage: Some(Stage::GeneratingContent),
            sub_stage: Some(sub),
            is_processing: true,
            label: Stage::GeneratingContent.label(),
            sub_label: Some(sub.label()),
            icon: IconHint::Spinner,
            actions: Vec::new(),
        };
    }

    if let Some(stage) = Stage::parse(raw) {
        return StageView {
            raw: raw.to_string(),
            stage: Some(stage),
            sub_stage: None,
            is_processing: stage.is_processing(),
            label: stage.label(),
            sub_label: None,
            icon: icon_for(stage),
            actions: actions_for(stage),
        };
    }

    log::debug!("Unrecognized pipeline status: {raw}");
    StageView {
        raw: raw.to_string(),
        stage: None,
        sub_stage: None,
        is_processing: false,
        label: "status unavailable",
        sub_label: None,
        icon: IconHint::Unknown,
        actions: Vec::new(),
    }
}

fn icon_for(stage: Stage) -> IconHint {
    match stage {
        Stage::VideoComplete => IconHint::Check,
        Stage::VideoScheduled => IconHint::Calendar,
        Stage::VideoPublished => IconHint::Globe,
        _ => IconHint::Spinner,
    }
}

fn actions_for(stage: Stage) -> Vec<ItemAction> {
    match stage {
        Stage::VideoComplete => vec![ItemAction::SchedulePublication, ItemAction::PlayVideo],
        Stage::VideoScheduled => vec![ItemAction::CancelSchedule, ItemAction::PlayVideo],
        Stage::VideoPublished => vec![ItemAction::OpenPublished],
        _ => Vec::new(),
    }
}
