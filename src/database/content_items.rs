//! Content item database operations
//!
//! Reads of the pipeline's authoritative state, plus the few writes the
//! surrounding dashboard performs (item creation, script edits while the
//! edit gate allows them). `status` is never written here — production
//! jobs own stage transitions.

use async_trait::async_trait;

use super::models::ContentItemRecord;
use super::{Database, StoreError};
use crate::core::pipeline::reconcile::ItemSource;

/// Extension trait for content-item operations
pub trait ContentItemOps {
    fn list_items(
        &self,
        channel_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ContentItemRecord>, sqlx::Error>> + Send;
    fn list_items_by_status(
        &self,
        channel_id: i64,
        status: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ContentItemRecord>, sqlx::Error>> + Send;
    fn get_item(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<ContentItemRecord>, sqlx::Error>> + Send;
    fn insert_item(
        &self,
        item: &ContentItemRecord,
    ) -> impl std::future::Future<Output = Result<i64, sqlx::Error>> + Send;
    fn update_script_text(
        &self,
        id: i64,
        script_text: &str,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl ContentItemOps for Database {
    async fn list_items(&self, channel_id: i64) -> Result<Vec<ContentItemRecord>, sqlx::Error> {
        sqlx::query_as::<_, ContentItemRecord>(
            "SELECT * FROM content_items WHERE channel_id = ? ORDER BY created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(self.pool())
        .await
    }

    async fn list_items_by_status(
        &self,
        channel_id: i64,
        status: &str,
    ) -> Result<Vec<ContentItemRecord>, sqlx::Error> {
        sqlx::query_as::<_, ContentItemRecord>(
            "SELECT * FROM content_items WHERE channel_id = ? AND status = ? ORDER BY created_at DESC",
        )
        .bind(channel_id)
        .bind(status)
        .fetch_all(self.pool())
        .await
    }

    async fn get_item(&self, id: i64) -> Result<Option<ContentItemRecord>, sqlx::Error> {
        sqlx::query_as::<_, ContentItemRecord>("SELECT * FROM content_items WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn insert_item(&self, item: &ContentItemRecord) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO content_items (channel_id, status, progress, video_source, script_text,
                audio_url, image_urls, footage_refs, video_url, has_captions,
                scheduled_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.channel_id)
        .bind(&item.status)
        .bind(item.progress)
        .bind(&item.video_source)
        .bind(&item.script_text)
        .bind(&item.audio_url)
        .bind(&item.image_urls)
        .bind(&item.footage_refs)
        .bind(&item.video_url)
        .bind(item.has_captions)
        .bind(&item.scheduled_at)
        .bind(&item.created_at)
        .bind(&item.updated_at)
        .execute(self.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update_script_text(&self, id: i64, script_text: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE content_items SET script_text = ?, updated_at = ? WHERE id = ?")
            .bind(script_text)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ItemSource for Database {
    async fn fetch_items(&self, channel_id: i64) -> Result<Vec<ContentItemRecord>, StoreError> {
        Ok(self.list_items(channel_id).await?)
    }
}
