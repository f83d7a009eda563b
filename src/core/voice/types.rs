use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Classified provider-level failure. Raw transport/HTTP detail never leaks
/// past this enum.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("voice not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("provider unavailable")]
    Unavailable,

    #[error("{0} does not support this operation")]
    Unsupported(Provider),

    #[error("provider error (status {status}): {body}")]
    Unknown { status: u16, body: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// Providers
// ============================================================================

/// Closed set of supported voice providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    ElevenLabs,
    FishAudio,
    Cartesia,
}

impl Provider {
    pub const ALL: &'static [Provider] =
        &[Provider::ElevenLabs, Provider::FishAudio, Provider::Cartesia];

    /// Stable wire identifier (database rows, proxy paths, cache keys).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElevenLabs => "elevenlabs",
            Self::FishAudio => "fish_audio",
            Self::Cartesia => "cartesia",
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ElevenLabs => "ElevenLabs",
            Self::FishAudio => "Fish Audio",
            Self::Cartesia => "Cartesia",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsupported provider identifiers are a programming error on the caller's
/// side, not a recoverable runtime condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported provider identifier: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "elevenlabs" => Ok(Self::ElevenLabs),
            "fish_audio" => Ok(Self::FishAudio),
            "cartesia" => Ok(Self::Cartesia),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

// ============================================================================
// Normalized Voice Record
// ============================================================================

/// Provider-agnostic voice record. Every raw provider payload is normalized
/// into this shape before it reaches a caller, regardless of which path
/// (proxy or direct) produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRecord {
    /// Provider-native voice/model ID.
    pub id: String,
    pub name: String,
    pub provider: Provider,
    pub language: Option<String>,
    /// Gender or category label, provider permitting.
    pub category: Option<String>,
    /// Absolute http(s) URL of a playable preview, when the provider has one.
    /// May be time-limited for some providers; never replay a stale value.
    pub preview_url: Option<String>,
    pub description: Option<String>,
    /// Provider-specific fields that do not generalize (popularity counts,
    /// tags, tier info).
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Validate a candidate preview URL. Anything that is not an absolute
/// http(s) URL is treated as no preview at all.
pub fn absolute_http_url(candidate: &str) -> Option<String> {
    match url::Url::parse(candidate) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            Some(candidate.to_string())
        }
        _ => {
            log::warn!("Dropping non-absolute preview URL: {candidate}");
            None
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Options for voice listing calls. Providers ignore what they don't support.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

/// Normalized paging facts extracted from a provider's list payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub next_page: Option<u32>,
    pub total: Option<u64>,
}

/// One page of normalized voices.
#[derive(Debug, Clone)]
pub struct VoicePage {
    pub voices: Vec<VoiceRecord>,
    pub page: PageInfo,
}
