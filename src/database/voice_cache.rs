//! Voice cache database operations
//!
//! Normalized voices cached by `(provider, voice_id)`. Refreshes replace
//! the whole row — provider URLs can expire between calls, so a stale row
//! must never be patched in place.

use async_trait::async_trait;

use super::models::VoiceCacheRecord;
use super::{Database, StoreError};
use crate::core::voice::resolution::VoiceCache;
use crate::core::voice::types::VoiceRecord;

/// Extension trait for voice cache operations
pub trait VoiceCacheOps {
    fn get_cached_voice(
        &self,
        provider: &str,
        voice_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<VoiceCacheRecord>, sqlx::Error>> + Send;
    fn upsert_cached_voice(
        &self,
        record: &VoiceCacheRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl VoiceCacheOps for Database {
    async fn get_cached_voice(
        &self,
        provider: &str,
        voice_id: &str,
    ) -> Result<Option<VoiceCacheRecord>, sqlx::Error> {
        sqlx::query_as::<_, VoiceCacheRecord>(
            "SELECT * FROM voice_cache WHERE provider = ? AND voice_id = ?",
        )
        .bind(provider)
        .bind(voice_id)
        .fetch_optional(self.pool())
        .await
    }

    async fn upsert_cached_voice(&self, record: &VoiceCacheRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO voice_cache (provider, voice_id, name, language, category,
                preview_url, description, extra, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(provider, voice_id) DO UPDATE SET
                name = excluded.name,
                language = excluded.language,
                category = excluded.category,
                preview_url = excluded.preview_url,
                description = excluded.description,
                extra = excluded.extra,
                cached_at = excluded.cached_at
            "#,
        )
        .bind(&record.provider)
        .bind(&record.voice_id)
        .bind(&record.name)
        .bind(&record.language)
        .bind(&record.category)
        .bind(&record.preview_url)
        .bind(&record.description)
        .bind(&record.extra)
        .bind(&record.cached_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VoiceCache for Database {
    async fn upsert_voice(&self, record: &VoiceRecord) -> Result<(), StoreError> {
        let row = VoiceCacheRecord::from_voice(record);
        self.upsert_cached_voice(&row).await?;
        Ok(())
    }
}
