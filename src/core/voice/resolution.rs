//! Two-path voice resolution
//!
//! The primary path goes through the serverless proxy in front of each
//! provider; any non-success there (including plain network failure, which
//! is folded into a synthetic transport result rather than an exception)
//! falls back to one direct provider call with a locally resolved
//! credential. Both paths feed the same per-provider normalization, so
//! callers cannot tell which path produced a record.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::credentials::{CredentialError, CredentialResolver};
use crate::database::StoreError;

use super::providers::{ProviderRegistry, VoiceProviderClient};
use super::types::{ListOptions, Provider, ProviderError, VoicePage, VoiceRecord};

// ============================================================================
// Error Types
// ============================================================================

/// Outcome of a failed primary (proxy) attempt. A `status` of `None` marks
/// the synthetic transport-failure case.
#[derive(Debug, Clone)]
pub struct PrimaryFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl PrimaryFailure {
    fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for PrimaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "proxy returned status {status}: {}", self.message),
            None => write!(f, "proxy unreachable: {}", self.message),
        }
    }
}

/// Single aggregated resolution error. Callers never have to inspect two
/// separate failures: a both-path failure carries both causes in one value.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("primary path failed ({primary}); fallback failed ({fallback})")]
    BothPathsFailed {
        primary: PrimaryFailure,
        fallback: ProviderError,
    },
}

impl ResolveError {
    /// One human-readable line for the UI, distinguishing missing
    /// credentials from provider-side trouble from a missing voice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Credential(CredentialError::NotFound(provider)) => format!(
                "No API key configured for {}. Add one in Settings to load voices.",
                provider.display_name()
            ),
            Self::Credential(e) => format!("Could not read stored credentials: {e}"),
            Self::BothPathsFailed { fallback, .. } => match fallback {
                ProviderError::NotFound(id) => format!("Voice {id} was not found."),
                ProviderError::Unauthorized => {
                    "The provider rejected the configured API key.".to_string()
                }
                ProviderError::RateLimited => {
                    "The provider is rate limiting requests. Try again shortly.".to_string()
                }
                _ => "The voice provider could not be reached.".to_string(),
            },
        }
    }
}

// ============================================================================
// Voice cache sink
// ============================================================================

/// Write side of the voice cache. Implemented by the database; refreshes
/// always upsert a whole new row keyed by `(provider, voice_id)`.
#[async_trait]
pub trait VoiceCache: Send + Sync {
    async fn upsert_voice(&self, record: &VoiceRecord) -> std::result::Result<(), StoreError>;
}

// ============================================================================
// Resolution Service
// ============================================================================

pub struct ResolutionService {
    http: Client,
    proxy_base: String,
    resolver: CredentialResolver,
    registry: ProviderRegistry,
    cache: Option<Arc<dyn VoiceCache>>,
}

impl ResolutionService {
    pub fn new(proxy_base: impl Into<String>, resolver: CredentialResolver) -> Self {
        Self::with_timeout(proxy_base, resolver, Duration::from_secs(20))
    }

    pub fn with_timeout(
        proxy_base: impl Into<String>,
        resolver: CredentialResolver,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client for voice resolution");
        Self {
            http,
            proxy_base: proxy_base.into().trim_end_matches('/').to_string(),
            resolver,
            registry: ProviderRegistry::new(),
            cache: None,
        }
    }

    /// Attach a voice cache. Upserts are still gated per provider by
    /// `preview_cacheable()`.
    pub fn with_cache(mut self, cache: Arc<dyn VoiceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the provider registry (tests point clients at mock servers).
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve one voice to its normalized record.
    pub async fn resolve_voice(
        &self,
        provider: Provider,
        voice_id: &str,
        supplied_key: Option<&str>,
    ) -> Result<VoiceRecord, ResolveError> {
        let client = self.registry.get(provider);

        let raw = match self
            .primary_fetch(provider, "voice", {
                let mut body = json!({ "voice_id": voice_id });
                if let Some(key) = supplied_key {
                    body["api_key"] = Value::String(key.to_string());
                }
                body
            })
            .await
        {
            Ok(data) => data,
            Err(primary) => {
                log::warn!("Primary path failed for {provider}/{voice_id}: {primary}");
                let api_key = self.fallback_key(provider, supplied_key).await?;
                match client.fetch_voice(voice_id, &api_key).await {
                    Ok(data) => data,
                    Err(fallback) => {
                        return Err(ResolveError::BothPathsFailed { primary, fallback })
                    }
                }
            }
        };

        let record = client.normalize(&raw);
        self.maybe_cache(client, &record).await;
        Ok(record)
    }

    /// List voices for a provider, normalized and paged.
    pub async fn list_voices(
        &self,
        provider: Provider,
        supplied_key: Option<&str>,
        opts: &ListOptions,
    ) -> Result<VoicePage, ResolveError> {
        let client = self.registry.get(provider);

        let raw = match self
            .primary_fetch(provider, "voices", {
                let mut body = json!({});
                if let Some(page) = opts.page {
                    body["page"] = Value::from(page);
                }
                if let Some(page_size) = opts.page_size {
                    body["page_size"] = Value::from(page_size);
                }
                if let Some(search) = &opts.search {
                    body["search"] = Value::String(search.clone());
                }
                if let Some(key) = supplied_key {
                    body["api_key"] = Value::String(key.to_string());
                }
                body
            })
            .await
        {
            Ok(data) => data,
            Err(primary) => {
                log::warn!("Primary list path failed for {provider}: {primary}");
                let api_key = self.fallback_key(provider, supplied_key).await?;
                match client.fetch_voice_list(&api_key, opts).await {
                    Ok(data) => data,
                    Err(fallback) => {
                        return Err(ResolveError::BothPathsFailed { primary, fallback })
                    }
                }
            }
        };

        let (items, page) = client.extract_list(&raw, opts);
        let voices: Vec<VoiceRecord> = items.iter().map(|item| client.normalize(item)).collect();
        for record in &voices {
            self.maybe_cache(client, record).await;
        }

        Ok(VoicePage { voices, page })
    }

    /// Primary path: call the proxy. Every failure mode collapses into a
    /// `PrimaryFailure` so the caller falls through uniformly.
    async fn primary_fetch(
        &self,
        provider: Provider,
        endpoint: &str,
        body: Value,
    ) -> Result<Value, PrimaryFailure> {
        let url = format!("{}/providers/{}/{endpoint}", self.proxy_base, provider);

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return Err(PrimaryFailure::transport(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PrimaryFailure {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: Value = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                return Err(PrimaryFailure {
                    status: Some(status.as_u16()),
                    message: format!("invalid proxy envelope: {e}"),
                })
            }
        };

        if envelope["success"].as_bool() == Some(true) {
            Ok(envelope["data"].clone())
        } else {
            Err(PrimaryFailure {
                status: Some(status.as_u16()),
                message: envelope["error"]
                    .as_str()
                    .unwrap_or("proxy reported failure")
                    .to_string(),
            })
        }
    }

    /// Credential chain for the fallback path: supplied value, stored key,
    /// then the demo sentinel for providers that document a public demo
    /// tier. Everyone else fails with the credential error.
    async fn fallback_key(
        &self,
        provider: Provider,
        supplied: Option<&str>,
    ) -> Result<String, ResolveError> {
        match self.resolver.resolve(provider, supplied).await {
            Ok(key) => Ok(key),
            Err(CredentialError::NotFound(p)) => match self.registry.get(provider).demo_api_key() {
                Some(demo) => {
                    log::info!("Using public demo credential for {provider}");
                    Ok(demo.to_string())
                }
                None => Err(CredentialError::NotFound(p).into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn maybe_cache(&self, client: &dyn VoiceProviderClient, record: &VoiceRecord) {
        if !client.preview_cacheable() {
            return;
        }
        let Some(cache) = &self.cache else { return };
        if let Err(e) = cache.upsert_voice(record).await {
            // Cache writes are best-effort; resolution already succeeded.
            log::warn!(
                "Voice cache upsert failed for {}/{}: {e}",
                record.provider,
                record.id
            );
        }
    }
}
