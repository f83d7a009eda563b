//! Credential resolution
//!
//! One API key per provider. Keys live in a credential store (SQLite table
//! or the system keychain); a caller-supplied key always wins over the
//! store, unvalidated.

use async_trait::async_trait;
use keyring::Entry;
use thiserror::Error;

use super::voice::types::Provider;

const KEYRING_SERVICE: &str = "reelsmith";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential store error: {0}")]
    Store(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("no credential configured for {}", .0.display_name())]
    NotFound(Provider),
}

pub type Result<T> = std::result::Result<T, CredentialError>;

// ============================================================================
// Credential Store
// ============================================================================

/// Read side of a credential store. At most one active key per provider;
/// storage uniqueness is enforced by the implementations, not worked around
/// here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_api_key(&self, provider: Provider) -> Result<Option<String>>;
}

// ============================================================================
// Credential Resolver
// ============================================================================

/// Resolves the API key to use for a provider call.
///
/// A non-empty supplied key is returned unchanged. Otherwise the store is
/// re-read on every call — no caching, so admin-side key rotation takes
/// effect immediately (credential checks are not on a hot path).
pub struct CredentialResolver {
    store: std::sync::Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    pub fn new(store: std::sync::Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, provider: Provider, supplied: Option<&str>) -> Result<String> {
        if let Some(key) = supplied {
            if !key.trim().is_empty() {
                return Ok(key.to_string());
            }
        }

        match self.store.get_api_key(provider).await? {
            Some(key) => Ok(key),
            None => Err(CredentialError::NotFound(provider)),
        }
    }
}

// ============================================================================
// Keyring-backed store
// ============================================================================

/// Credential store backed by the operating system keychain, for operator
/// machines where keys should not sit in the SQLite file.
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry_key(provider: Provider) -> String {
        format!("voice_{provider}")
    }

    /// Store an API key for a provider.
    pub fn store_api_key(&self, provider: Provider, api_key: &str) -> Result<()> {
        let entry = Entry::new(&self.service, &Self::entry_key(provider))?;
        entry.set_password(api_key)?;
        log::info!("Stored API key for provider: {provider}");
        Ok(())
    }

    /// Delete a provider's API key. Deleting a missing key is not an error.
    pub fn delete_api_key(&self, provider: Provider) -> Result<()> {
        let entry = Entry::new(&self.service, &Self::entry_key(provider))?;
        match entry.delete_password() {
            Ok(()) => {
                log::info!("Deleted API key for provider: {provider}");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keyring(e)),
        }
    }

    fn read_api_key(&self, provider: Provider) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, &Self::entry_key(provider))?;
        match entry.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Keyring(e)),
        }
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn get_api_key(&self, provider: Provider) -> Result<Option<String>> {
        self.read_api_key(provider)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Mask an API key for display (show first 4 and last 4 chars)
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        return "********".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}
