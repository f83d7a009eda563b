//! Voice provider clients.
//!
//! One client per provider, each owning that provider's auth conventions,
//! payload shape, preview-URL extraction priority, and error classification.
//! Callers reach clients exclusively through a [`ProviderRegistry`].

pub mod cartesia;
pub mod elevenlabs;
pub mod fish_audio;

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::Value;

use super::types::{ListOptions, PageInfo, Provider, ProviderError, Result, VoiceRecord};

use cartesia::CartesiaClient;
use elevenlabs::ElevenLabsClient;
use fish_audio::FishAudioClient;

/// Provider calls are human-interactive, not batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Normalized operations against one external voice provider.
///
/// `fetch_voice`/`fetch_voice_list` return the provider-native payload;
/// `normalize`/`extract_list` are pure and shared by both resolution paths,
/// so proxy-fetched and directly-fetched payloads are indistinguishable to
/// callers.
#[async_trait]
pub trait VoiceProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fetch one voice's raw detail payload.
    async fn fetch_voice(&self, voice_id: &str, api_key: &str) -> Result<Value>;

    /// Fetch the raw voice list payload.
    async fn fetch_voice_list(&self, api_key: &str, opts: &ListOptions) -> Result<Value>;

    /// Pull the individual voice payloads plus paging facts out of a raw
    /// list payload.
    fn extract_list(&self, raw: &Value, opts: &ListOptions) -> (Vec<Value>, PageInfo);

    /// Normalize one raw voice payload. The preview-URL priority order
    /// applied here is part of the provider contract.
    fn normalize(&self, raw: &Value) -> VoiceRecord;

    /// Whether this provider's preview URLs are stable enough to persist.
    /// Providers returning signed, time-limited URLs must say `false`.
    fn preview_cacheable(&self) -> bool {
        true
    }

    /// Last-resort credential for providers with a documented public demo
    /// tier. `None` for everyone else.
    fn demo_api_key(&self) -> Option<&'static str> {
        None
    }
}

fn shared_http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client for provider calls")
}

/// Closed mapping from provider identifier to its client. Total over the
/// `Provider` enum; string identifiers fail fast at `Provider::from_str`
/// before they ever get here.
pub struct ProviderRegistry {
    elevenlabs: ElevenLabsClient,
    fish_audio: FishAudioClient,
    cartesia: CartesiaClient,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            elevenlabs: ElevenLabsClient::new(shared_http_client()),
            fish_audio: FishAudioClient::new(shared_http_client()),
            cartesia: CartesiaClient::new(shared_http_client()),
        }
    }

    /// Registry over explicitly constructed clients (tests point these at
    /// local mock servers).
    pub fn with_clients(
        elevenlabs: ElevenLabsClient,
        fish_audio: FishAudioClient,
        cartesia: CartesiaClient,
    ) -> Self {
        Self {
            elevenlabs,
            fish_audio,
            cartesia,
        }
    }

    pub fn get(&self, provider: Provider) -> &dyn VoiceProviderClient {
        match provider {
            Provider::ElevenLabs => &self.elevenlabs,
            Provider::FishAudio => &self.fish_audio,
            Provider::Cartesia => &self.cartesia,
        }
    }
}

/// Process-wide default registry.
pub fn registry() -> &'static ProviderRegistry {
    static REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::new);
    &REGISTRY
}

/// Shared non-2xx classification. 2xx is the only success signal; a body
/// alone proves nothing.
pub(crate) async fn classify_error_response(
    response: reqwest::Response,
    voice_id: Option<&str>,
) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match status {
        401 | 403 => ProviderError::Unauthorized,
        404 => ProviderError::NotFound(voice_id.unwrap_or("<list>").to_string()),
        429 => ProviderError::RateLimited,
        s if s >= 500 => ProviderError::Unavailable,
        s => ProviderError::Unknown {
            status: s,
            body: truncate_body(body),
        },
    }
}

fn truncate_body(body: String) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        body
    } else {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &body[..cut])
    }
}
