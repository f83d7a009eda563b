use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::voice::providers::{classify_error_response, VoiceProviderClient};
use crate::core::voice::types::{ListOptions, PageInfo, Provider, Result, VoiceRecord};

const DEFAULT_API_BASE: &str = "https://api.cartesia.ai";

/// Cartesia pins API behavior to a dated version header.
const API_VERSION: &str = "2025-04-16";

/// Cartesia voice API. Auth via `X-API-Key` plus a `Cartesia-Version` header.
///
/// Cartesia exposes no preview asset for its voices; normalized records
/// always carry `preview_url: None`, which callers must treat as an
/// expected condition.
pub struct CartesiaClient {
    client: Client,
    base_url: String,
}

impl CartesiaClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_API_BASE)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VoiceProviderClient for CartesiaClient {
    fn provider(&self) -> Provider {
        Provider::Cartesia
    }

    async fn fetch_voice(&self, voice_id: &str, api_key: &str) -> Result<Value> {
        let url = format!("{}/voices/{voice_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", api_key)
            .header("Cartesia-Version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, Some(voice_id)).await);
        }

        Ok(response.json().await?)
    }

    async fn fetch_voice_list(&self, api_key: &str, _opts: &ListOptions) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("X-API-Key", api_key)
            .header("Cartesia-Version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, None).await);
        }

        Ok(response.json().await?)
    }

    fn extract_list(&self, raw: &Value, _opts: &ListOptions) -> (Vec<Value>, PageInfo) {
        // Returned either bare (`[..]`) or wrapped (`{"voices": [..]}`)
        // depending on API version.
        let items = raw
            .as_array()
            .or_else(|| raw["voices"].as_array())
            .map(|arr| arr.to_vec())
            .unwrap_or_default();
        (items, PageInfo::default())
    }

    fn normalize(&self, raw: &Value) -> VoiceRecord {
        let mut extra = serde_json::Map::new();
        if let Some(is_public) = raw["is_public"].as_bool() {
            extra.insert("is_public".to_string(), Value::Bool(is_public));
        }
        if let Some(created_at) = raw["created_at"].as_str() {
            extra.insert(
                "created_at".to_string(),
                Value::String(created_at.to_string()),
            );
        }

        VoiceRecord {
            id: raw["id"].as_str().unwrap_or_default().to_string(),
            name: raw["name"].as_str().unwrap_or_default().to_string(),
            provider: Provider::Cartesia,
            language: raw["language"].as_str().map(String::from),
            category: raw["gender"].as_str().map(String::from),
            preview_url: None,
            description: raw["description"].as_str().map(String::from),
            extra,
        }
    }
}
