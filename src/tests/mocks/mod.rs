//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::pipeline::reconcile::ItemSource;
use crate::core::voice::resolution::VoiceCache;
use crate::core::voice::types::VoiceRecord;
use crate::database::models::ContentItemRecord;
use crate::database::StoreError;

// ============================================================================
// Item source
// ============================================================================

/// Scripted `ItemSource` that counts calls, optionally sleeps to simulate a
/// slow backend, and can be told to fail the next N fetches.
pub struct MockItemSource {
    items: Mutex<Vec<ContentItemRecord>>,
    calls: AtomicUsize,
    delay: Duration,
    fail_remaining: AtomicUsize,
}

impl MockItemSource {
    pub fn new(items: Vec<ContentItemRecord>) -> Self {
        Self {
            items: Mutex::new(items),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_remaining: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_items(&self, items: Vec<ContentItemRecord>) {
        *self.items.lock().unwrap() = items;
    }
}

#[async_trait]
impl ItemSource for MockItemSource {
    async fn fetch_items(&self, _channel_id: i64) -> Result<Vec<ContentItemRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        Ok(self.items.lock().unwrap().clone())
    }
}

// ============================================================================
// Voice cache
// ============================================================================

/// Cache double that records every upsert.
#[derive(Default)]
pub struct RecordingVoiceCache {
    upserts: Mutex<Vec<VoiceRecord>>,
}

impl RecordingVoiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upserted(&self) -> Vec<VoiceRecord> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceCache for RecordingVoiceCache {
    async fn upsert_voice(&self, record: &VoiceRecord) -> Result<(), StoreError> {
        self.upserts.lock().unwrap().push(record.clone());
        Ok(())
    }
}
