//! Provider credential database operations
//!
//! The UNIQUE constraint on `provider` makes "which row wins" a
//! non-question: there is at most one.

use async_trait::async_trait;

use super::models::CredentialRecord;
use super::Database;
use crate::core::credentials::{CredentialError, CredentialStore};
use crate::core::voice::types::Provider;

/// Extension trait for credential operations
pub trait CredentialOps {
    fn get_credential(
        &self,
        provider: &str,
    ) -> impl std::future::Future<Output = Result<Option<CredentialRecord>, sqlx::Error>> + Send;
    fn upsert_credential(
        &self,
        provider: &str,
        api_key: &str,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_credential(
        &self,
        provider: &str,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl CredentialOps for Database {
    async fn get_credential(
        &self,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT * FROM provider_credentials WHERE provider = ?",
        )
        .bind(provider)
        .fetch_optional(self.pool())
        .await
    }

    async fn upsert_credential(&self, provider: &str, api_key: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO provider_credentials (provider, api_key, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(provider) DO UPDATE SET api_key = excluded.api_key
            "#,
        )
        .bind(provider)
        .bind(api_key)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_credential(&self, provider: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM provider_credentials WHERE provider = ?")
            .bind(provider)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn get_api_key(&self, provider: Provider) -> Result<Option<String>, CredentialError> {
        let record = self
            .get_credential(provider.as_str())
            .await
            .map_err(|e| CredentialError::Store(e.to_string()))?;
        Ok(record.map(|r| r.api_key))
    }
}
