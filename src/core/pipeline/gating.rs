//! Client-side gating rules.
//!
//! These checks run locally against the last reconciled state — no network
//! call is spent to find out that an action would be rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::models::ContentItemRecord;

use super::stage::SubStage;

// ============================================================================
// Script editing
// ============================================================================

/// Why the script body is read-only. One distinct reason per condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditLockReason {
    AudioExists,
    ImagesExist,
    NotInScriptStage,
    VideoExists,
}

impl EditLockReason {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AudioExists => "Narration has already been generated from this script.",
            Self::ImagesExist => "Images have already been generated from this script.",
            Self::NotInScriptStage => "The script can only be edited right after generation.",
            Self::VideoExists => "A video has already been rendered from this script.",
        }
    }
}

/// Result of the script-edit gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptGate {
    pub editable: bool,
    /// Every condition currently locking the field, in check order.
    pub reasons: Vec<EditLockReason>,
}

impl ScriptGate {
    /// The primary lock reason, if any.
    pub fn reason(&self) -> Option<EditLockReason> {
        self.reasons.first().copied()
    }
}

/// The script body is editable only while nothing downstream has consumed
/// it: no narration audio, no generated images, no rendered video, and the
/// item is sitting exactly at `script_generated`.
pub fn script_gate(item: &ContentItemRecord) -> ScriptGate {
    let mut reasons = Vec::new();

    if item.audio_url.is_some() {
        reasons.push(EditLockReason::AudioExists);
    }
    if !item.image_urls().is_empty() {
        reasons.push(EditLockReason::ImagesExist);
    }
    if item.status != SubStage::SCRIPT_GENERATED {
        reasons.push(EditLockReason::NotInScriptStage);
    }
    if item.video_url.is_some() {
        reasons.push(EditLockReason::VideoExists);
    }

    ScriptGate {
        editable: reasons.is_empty(),
        reasons,
    }
}

// ============================================================================
// Render submission
// ============================================================================

/// Source material an item is rendered from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    StillImages,
    StockFootage,
}

impl VideoSource {
    /// Unrecognized source strings are treated as still-image items, the
    /// stricter default.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stock_footage" => Self::StockFootage,
            _ => Self::StillImages,
        }
    }
}

/// Rejected render submission: which items lack the assets their source
/// type requires. Computed entirely client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionBlocked {
    pub missing_images: Vec<i64>,
    pub missing_footage: Vec<i64>,
}

impl fmt::Display for SubmissionBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_images.is_empty() {
            parts.push(format!(
                "items missing images: {}",
                join_ids(&self.missing_images)
            ));
        }
        if !self.missing_footage.is_empty() {
            parts.push(format!(
                "items missing footage: {}",
                join_ids(&self.missing_footage)
            ));
        }
        write!(f, "cannot submit for rendering — {}", parts.join("; "))
    }
}

impl std::error::Error for SubmissionBlocked {}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a batch of items before a render submission. Still-image items
/// need at least one image asset; stock-footage items need at least one
/// selected footage reference.
pub fn check_render_submission(items: &[ContentItemRecord]) -> Result<(), SubmissionBlocked> {
    let mut missing_images = Vec::new();
    let mut missing_footage = Vec::new();

    for item in items {
        match VideoSource::parse(&item.video_source) {
            VideoSource::StillImages => {
                if item.image_urls().is_empty() {
                    missing_images.push(item.id);
                }
            }
            VideoSource::StockFootage => {
                if item.footage_refs().is_empty() {
                    missing_footage.push(item.id);
                }
            }
        }
    }

    if missing_images.is_empty() && missing_footage.is_empty() {
        Ok(())
    } else {
        Err(SubmissionBlocked {
            missing_images,
            missing_footage,
        })
    }
}
