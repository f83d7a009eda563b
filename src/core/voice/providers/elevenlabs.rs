use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::voice::providers::{classify_error_response, VoiceProviderClient};
use crate::core::voice::types::{
    absolute_http_url, ListOptions, PageInfo, Provider, Result, VoiceRecord,
};

const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io/v1";

/// ElevenLabs voice API. Auth via the `xi-api-key` header.
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
}

impl ElevenLabsClient {
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
impl VoiceProviderClient for ElevenLabsClient {
    fn provider(&self) -> Provider {
        Provider::ElevenLabs
    }

    async fn fetch_voice(&self, voice_id: &str, api_key: &str) -> Result<Value> {
        let url = format!("{}/voices/{voice_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, Some(voice_id)).await);
        }

        Ok(response.json().await?)
    }

    async fn fetch_voice_list(&self, api_key: &str, _opts: &ListOptions) -> Result<Value> {
        // The v1 voices endpoint returns the full account catalog unpaged.
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, None).await);
        }

        Ok(response.json().await?)
    }

    fn extract_list(&self, raw: &Value, _opts: &ListOptions) -> (Vec<Value>, PageInfo) {
        let items = raw["voices"]
            .as_array()
            .map(|arr| arr.to_vec())
            .unwrap_or_default();
        (items, PageInfo::default())
    }

    /// Preview priority: top-level `preview_url`, else the first entry of
    /// the `samples` array. Payload shape has drifted across API versions,
    /// so both locations are part of the contract.
    fn normalize(&self, raw: &Value) -> VoiceRecord {
        let labels = &raw["labels"];

        let preview_url = raw["preview_url"]
            .as_str()
            .and_then(absolute_http_url)
            .or_else(|| {
                raw["samples"][0]["preview_url"]
                    .as_str()
                    .and_then(absolute_http_url)
            });

        let mut extra = serde_json::Map::new();
        if let Some(category) = raw["category"].as_str() {
            extra.insert("category".to_string(), Value::String(category.to_string()));
        }
        if let Some(labels) = labels.as_object() {
            extra.insert("labels".to_string(), Value::Object(labels.clone()));
        }
        if let Some(samples) = raw["samples"].as_array() {
            extra.insert("sample_count".to_string(), Value::from(samples.len()));
        }

        VoiceRecord {
            id: raw["voice_id"].as_str().unwrap_or_default().to_string(),
            name: raw["name"].as_str().unwrap_or_default().to_string(),
            provider: Provider::ElevenLabs,
            language: labels["language"].as_str().map(String::from),
            category: labels["gender"]
                .as_str()
                .or_else(|| raw["category"].as_str())
                .map(String::from),
            preview_url,
            description: raw["description"].as_str().map(String::from),
            extra,
        }
    }
}
