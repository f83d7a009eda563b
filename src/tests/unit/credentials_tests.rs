//! Credential resolver behavior against a mocked store.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;

use crate::core::credentials::{CredentialError, CredentialResolver, CredentialStore};
use crate::core::voice::types::Provider;

mock! {
    pub Store {}

    #[async_trait]
    impl CredentialStore for Store {
        async fn get_api_key(
            &self,
            provider: Provider,
        ) -> Result<Option<String>, CredentialError>;
    }
}

#[tokio::test]
async fn test_supplied_key_never_touches_the_store() {
    let mut store = MockStore::new();
    store.expect_get_api_key().times(0);

    let resolver = CredentialResolver::new(Arc::new(store));
    let key = resolver
        .resolve(Provider::ElevenLabs, Some("caller-key"))
        .await
        .unwrap();
    assert_eq!(key, "caller-key");
}

#[tokio::test]
async fn test_store_is_reread_on_every_call() {
    let mut store = MockStore::new();
    // No caching: two resolutions mean two store reads
    store
        .expect_get_api_key()
        .with(eq(Provider::FishAudio))
        .times(2)
        .returning(|_| Ok(Some("fish-key".to_string())));

    let resolver = CredentialResolver::new(Arc::new(store));
    for _ in 0..2 {
        let key = resolver.resolve(Provider::FishAudio, None).await.unwrap();
        assert_eq!(key, "fish-key");
    }
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let mut store = MockStore::new();
    store
        .expect_get_api_key()
        .returning(|_| Err(CredentialError::Store("connection lost".to_string())));

    let resolver = CredentialResolver::new(Arc::new(store));
    let err = resolver
        .resolve(Provider::Cartesia, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Store(_)));
}
