//! Database Records
//!
//! Records for content items, provider credentials, and the voice cache.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::voice::types::VoiceRecord;

// ============================================================================
// Content Item Record
// ============================================================================

/// One unit of production (a script, later a rendered video).
///
/// `status` is written exclusively by the external production jobs and is
/// monotonic under normal operation; this core only reads it. Asset URL
/// columns are non-null only once the stage that produces them has been
/// reached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentItemRecord {
    pub id: i64,
    pub channel_id: i64,
    pub status: String,
    /// Percent complete (0-100) reported by the active production job.
    pub progress: Option<i64>,
    pub video_source: String, // "still_images" or "stock_footage"
    pub script_text: Option<String>,
    pub audio_url: Option<String>,
    pub image_urls: String,   // JSON array
    pub footage_refs: String, // JSON array
    pub video_url: Option<String>,
    pub has_captions: bool,
    pub scheduled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentItemRecord {
    pub fn new(channel_id: i64, video_source: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: 0,
            channel_id,
            status: "generating_script".to_string(),
            progress: None,
            video_source: video_source.to_string(),
            script_text: None,
            audio_url: None,
            image_urls: "[]".to_string(),
            footage_refs: "[]".to_string(),
            video_url: None,
            has_captions: false,
            scheduled_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn image_urls(&self) -> Vec<String> {
        serde_json::from_str(&self.image_urls).unwrap_or_default()
    }

    pub fn set_image_urls(&mut self, urls: &[String]) {
        self.image_urls = serde_json::to_string(urls).unwrap_or_else(|_| "[]".to_string());
    }

    pub fn footage_refs(&self) -> Vec<String> {
        serde_json::from_str(&self.footage_refs).unwrap_or_default()
    }

    pub fn set_footage_refs(&mut self, refs: &[String]) {
        self.footage_refs = serde_json::to_string(refs).unwrap_or_else(|_| "[]".to_string());
    }
}

// ============================================================================
// Credential Record
// ============================================================================

/// One API key per provider. Managed by admin tooling; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CredentialRecord {
    pub id: i64,
    pub provider: String,
    pub api_key: String,
    pub created_at: String,
}

// ============================================================================
// Voice Cache Record
// ============================================================================

/// Cached normalized voice, keyed by `(provider, voice_id)`. Rows are
/// replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VoiceCacheRecord {
    pub provider: String,
    pub voice_id: String,
    pub name: String,
    pub language: Option<String>,
    pub category: Option<String>,
    pub preview_url: Option<String>,
    pub description: Option<String>,
    pub extra: String, // JSON object
    pub cached_at: String,
}

impl VoiceCacheRecord {
    pub fn from_voice(record: &VoiceRecord) -> Self {
        Self {
            provider: record.provider.as_str().to_string(),
            voice_id: record.id.clone(),
            name: record.name.clone(),
            language: record.language.clone(),
            category: record.category.clone(),
            preview_url: record.preview_url.clone(),
            description: record.description.clone(),
            extra: serde_json::to_string(&record.extra).unwrap_or_else(|_| "{}".to_string()),
            cached_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
