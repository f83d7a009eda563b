use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::voice::providers::{classify_error_response, VoiceProviderClient};
use crate::core::voice::types::{
    absolute_http_url, ListOptions, PageInfo, Provider, Result, VoiceRecord,
};

const DEFAULT_API_BASE: &str = "https://api.fish.audio";

/// Sentinel accepted by Fish Audio's public demo tier.
const DEMO_API_KEY: &str = "public-demo";

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Fish Audio model API. Auth via `Authorization: Bearer`.
///
/// Sample URLs returned by this provider carry signed, time-limited access
/// parameters. They must be re-resolved per playback and never persisted.
pub struct FishAudioClient {
    client: Client,
    base_url: String,
}

impl FishAudioClient {
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
impl VoiceProviderClient for FishAudioClient {
    fn provider(&self) -> Provider {
        Provider::FishAudio
    }

    async fn fetch_voice(&self, voice_id: &str, api_key: &str) -> Result<Value> {
        let url = format!("{}/model/{voice_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, Some(voice_id)).await);
        }

        Ok(response.json().await?)
    }

    async fn fetch_voice_list(&self, api_key: &str, opts: &ListOptions) -> Result<Value> {
        let mut request = self
            .client
            .get(format!("{}/model", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .query(&[
                ("page_number", opts.page.unwrap_or(1)),
                ("page_size", opts.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
            ]);
        if let Some(search) = &opts.search {
            request = request.query(&[("title", search.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(classify_error_response(response, None).await);
        }

        Ok(response.json().await?)
    }

    fn extract_list(&self, raw: &Value, opts: &ListOptions) -> (Vec<Value>, PageInfo) {
        let items = raw["items"]
            .as_array()
            .map(|arr| arr.to_vec())
            .unwrap_or_default();

        let total = raw["total"].as_u64();
        let page = opts.page.unwrap_or(1);
        let page_size = opts.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let next_page = match total {
            Some(total) if u64::from(page) * u64::from(page_size) < total => Some(page + 1),
            _ => None,
        };

        (items, PageInfo { next_page, total })
    }

    /// Preview priority: first `samples[].audio`, else top-level
    /// `preview_audio`. Either way the URL is signed and short-lived.
    fn normalize(&self, raw: &Value) -> VoiceRecord {
        let preview_url = raw["samples"][0]["audio"]
            .as_str()
            .and_then(absolute_http_url)
            .or_else(|| raw["preview_audio"].as_str().and_then(absolute_http_url));

        let mut extra = serde_json::Map::new();
        if let Some(tags) = raw["tags"].as_array() {
            extra.insert("tags".to_string(), Value::Array(tags.clone()));
        }
        if let Some(likes) = raw["like_count"].as_u64() {
            extra.insert("like_count".to_string(), Value::from(likes));
        }
        if let Some(tasks) = raw["task_count"].as_u64() {
            extra.insert("task_count".to_string(), Value::from(tasks));
        }
        if let Some(author) = raw["author"]["nickname"].as_str() {
            extra.insert("author".to_string(), Value::String(author.to_string()));
        }

        VoiceRecord {
            id: raw["_id"].as_str().unwrap_or_default().to_string(),
            name: raw["title"].as_str().unwrap_or_default().to_string(),
            provider: Provider::FishAudio,
            language: raw["languages"][0].as_str().map(String::from),
            category: raw["tags"][0].as_str().map(String::from),
            preview_url,
            description: raw["description"]
                .as_str()
                .filter(|d| !d.is_empty())
                .map(String::from),
            extra,
        }
    }

    fn preview_cacheable(&self) -> bool {
        false
    }

    fn demo_api_key(&self) -> Option<&'static str> {
        Some(DEMO_API_KEY)
    }
}
