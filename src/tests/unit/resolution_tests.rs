//! Two-path resolution tests.
//!
//! The proxy (primary path) and the provider APIs (fallback path) are both
//! wiremock servers, so every row of the fallback matrix is observable:
//! which path ran, how often, and with which credentials.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::credentials::{CredentialError, CredentialResolver, CredentialStore};
use crate::core::voice::providers::{
    cartesia::CartesiaClient, elevenlabs::ElevenLabsClient, fish_audio::FishAudioClient,
    ProviderRegistry,
};
use crate::core::voice::resolution::{ResolutionService, ResolveError};
use crate::core::voice::types::{ListOptions, Provider};
use crate::tests::mocks::RecordingVoiceCache;

// ============================================================================
// Helpers
// ============================================================================

struct StaticCredentialStore(HashMap<Provider, String>);

impl StaticCredentialStore {
    fn with(entries: &[(Provider, &str)]) -> Arc<Self> {
        Arc::new(Self(
            entries.iter().map(|(p, k)| (*p, k.to_string())).collect(),
        ))
    }

    fn empty() -> Arc<Self> {
        Self::with(&[])
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn get_api_key(
        &self,
        provider: Provider,
    ) -> Result<Option<String>, CredentialError> {
        Ok(self.0.get(&provider).cloned())
    }
}

fn registry_for(provider_server: &MockServer) -> ProviderRegistry {
    let http = reqwest::Client::new();
    ProviderRegistry::with_clients(
        ElevenLabsClient::with_base_url(http.clone(), provider_server.uri()),
        FishAudioClient::with_base_url(http.clone(), provider_server.uri()),
        CartesiaClient::with_base_url(http, provider_server.uri()),
    )
}

fn service(
    proxy_base: String,
    provider_server: &MockServer,
    store: Arc<dyn CredentialStore>,
) -> ResolutionService {
    ResolutionService::new(proxy_base, CredentialResolver::new(store))
        .with_registry(registry_for(provider_server))
}

/// Base URL guaranteed to refuse connections (bound then dropped).
fn refused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn elevenlabs_voice_payload() -> serde_json::Value {
    json!({
        "voice_id": "v1",
        "name": "Rachel",
        "category": "premade",
        "labels": { "gender": "female", "language": "en" },
        "preview_url": "https://cdn.example.com/rachel.mp3"
    })
}

// ============================================================================
// Primary path
// ============================================================================

#[tokio::test]
async fn test_primary_success_skips_fallback_entirely() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": elevenlabs_voice_payload()
        })))
        .expect(1)
        .mount(&proxy)
        .await;

    // Any direct provider call would be a failure of the test
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider_api)
        .await;

    // Empty store: primary success must not need a credential at all
    let svc = service(proxy.uri(), &provider_api, StaticCredentialStore::empty());
    let record = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();

    assert_eq!(record.provider, Provider::ElevenLabs);
    assert_eq!(record.id, "v1");
    assert_eq!(record.name, "Rachel");
    assert_eq!(
        record.preview_url.as_deref(),
        Some("https://cdn.example.com/rachel.mp3")
    );
}

#[tokio::test]
async fn test_primary_success_is_idempotent() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": elevenlabs_voice_payload()
        })))
        .expect(2)
        .mount(&proxy)
        .await;

    let svc = service(proxy.uri(), &provider_api, StaticCredentialStore::empty());
    let first = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();
    let second = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();

    assert_eq!(first.provider, second.provider);
    assert_eq!(first.id, second.id);
    assert_eq!(first.name, second.name);
}

// ============================================================================
// Fallback path
// ============================================================================

#[tokio::test]
async fn test_primary_500_invokes_fallback_exactly_once() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/voices/v1"))
        .and(header("xi-api-key", "store-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elevenlabs_voice_payload()))
        .expect(1)
        .mount(&provider_api)
        .await;

    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    let svc = service(proxy.uri(), &provider_api, store);
    let record = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();

    assert_eq!(record.provider, Provider::ElevenLabs);
    assert_eq!(record.name, "Rachel");
}

#[tokio::test]
async fn test_transport_failure_is_synthesized_and_falls_back() {
    let provider_api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/voices/v1"))
        .and(header("xi-api-key", "store-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elevenlabs_voice_payload()))
        .expect(1)
        .mount(&provider_api)
        .await;

    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    // Proxy base points at a dead port: connection refused, not an HTTP status
    let svc = service(refused_base_url(), &provider_api, store);
    let record = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();

    assert_eq!(record.provider, Provider::ElevenLabs);
}

#[tokio::test]
async fn test_envelope_failure_counts_as_primary_failure() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    // 2xx transport but the proxy itself reports failure
    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "upstream exploded"
        })))
        .expect(1)
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/voices/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elevenlabs_voice_payload()))
        .expect(1)
        .mount(&provider_api)
        .await;

    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    let svc = service(proxy.uri(), &provider_api, store);
    let record = svc
        .resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();

    assert_eq!(record.id, "v1");
}

#[tokio::test]
async fn test_supplied_key_reaches_fallback_call() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/voices/v1"))
        .and(header("xi-api-key", "caller-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elevenlabs_voice_payload()))
        .expect(1)
        .mount(&provider_api)
        .await;

    // Store holds a different key; the caller override must win
    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    let svc = service(proxy.uri(), &provider_api, store);
    svc.resolve_voice(Provider::ElevenLabs, "v1", Some("caller-key"))
        .await
        .unwrap();
}

// ============================================================================
// Failure aggregation and credential chain
// ============================================================================

#[tokio::test]
async fn test_both_paths_failed_is_one_aggregated_error() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/voices/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&provider_api)
        .await;

    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    let svc = service(proxy.uri(), &provider_api, store);
    let err = svc
        .resolve_voice(Provider::ElevenLabs, "missing", None)
        .await
        .unwrap_err();

    match err {
        ResolveError::BothPathsFailed { primary, fallback } => {
            assert_eq!(primary.status, Some(503));
            assert!(matches!(
                fallback,
                crate::core::voice::types::ProviderError::NotFound(_)
            ));
        }
        other => panic!("expected BothPathsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_credential_without_demo_tier_never_calls_provider() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/cartesia/voice"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider_api)
        .await;

    let svc = service(proxy.uri(), &provider_api, StaticCredentialStore::empty());
    let err = svc
        .resolve_voice(Provider::Cartesia, "v9", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Credential(CredentialError::NotFound(Provider::Cartesia))
    ));
}

#[tokio::test]
async fn test_demo_sentinel_applies_only_to_demo_tier_provider() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/fish_audio/voice"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/model/m1"))
        .and(header("Authorization", "Bearer public-demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "m1",
            "title": "Demo Voice",
            "samples": [ { "audio": "https://cdn.fish.audio/s.mp3?X-Amz-Expires=900" } ]
        })))
        .expect(1)
        .mount(&provider_api)
        .await;

    let svc = service(proxy.uri(), &provider_api, StaticCredentialStore::empty());
    let record = svc
        .resolve_voice(Provider::FishAudio, "m1", None)
        .await
        .unwrap();

    assert_eq!(record.provider, Provider::FishAudio);
    assert_eq!(record.name, "Demo Voice");
}

// ============================================================================
// Cache discipline
// ============================================================================

#[tokio::test]
async fn test_cache_upsert_respects_provider_cacheable_flag() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": elevenlabs_voice_payload()
        })))
        .mount(&proxy)
        .await;

    Mock::given(method("POST"))
        .and(path("/providers/fish_audio/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "_id": "m1",
                "title": "Ephemeral",
                "samples": [ { "audio": "https://cdn.fish.audio/s.mp3?X-Amz-Expires=900" } ]
            }
        })))
        .mount(&proxy)
        .await;

    let cache = Arc::new(RecordingVoiceCache::new());
    let svc = service(proxy.uri(), &provider_api, StaticCredentialStore::empty())
        .with_cache(cache.clone());

    svc.resolve_voice(Provider::ElevenLabs, "v1", None)
        .await
        .unwrap();
    svc.resolve_voice(Provider::FishAudio, "m1", None)
        .await
        .unwrap();

    let upserts = cache.upserted();
    // ElevenLabs previews are stable and get cached; Fish Audio's signed
    // URLs never reach the cache.
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].provider, Provider::ElevenLabs);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_voices_falls_back_and_normalizes() {
    let proxy = MockServer::start().await;
    let provider_api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/providers/elevenlabs/voices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&proxy)
        .await;

    Mock::given(method("GET"))
        .and(path("/voices"))
        .and(header("xi-api-key", "store-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voices": [
                elevenlabs_voice_payload(),
                { "voice_id": "v2", "name": "Adam", "labels": { "gender": "male" } }
            ]
        })))
        .expect(1)
        .mount(&provider_api)
        .await;

    let store = StaticCredentialStore::with(&[(Provider::ElevenLabs, "store-key")]);
    let svc = service(proxy.uri(), &provider_api, store);
    let page = svc
        .list_voices(Provider::ElevenLabs, None, &ListOptions::default())
        .await
        .unwrap();

    assert_eq!(page.voices.len(), 2);
    assert!(page
        .voices
        .iter()
        .all(|v| v.provider == Provider::ElevenLabs));
    assert_eq!(page.voices[1].name, "Adam");
    assert_eq!(page.page.next_page, None);
}
