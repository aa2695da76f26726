use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::{
    collection::{Document, DocumentCollection, InMemoryCollection},
    error::StoreError,
};

/// In-memory collection that can be switched into failing every call, and
/// can hold `get_all` until released.
pub(crate) struct FlakyCollection {
    inner: InMemoryCollection,
    failing: AtomicBool,
    hold_listing: AtomicBool,
    release: Notify,
    pub(crate) listings: AtomicUsize,
}

impl FlakyCollection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCollection::new("todoItems"),
            failing: AtomicBool::new(false),
            hold_listing: AtomicBool::new(false),
            release: Notify::new(),
            listings: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn hold_listings(&self, hold: bool) {
        self.hold_listing.store(hold, Ordering::SeqCst);
    }

    pub(crate) fn release_one(&self) {
        self.release.notify_one();
    }

    pub(crate) async fn raw_set(&self, key: &str, document: Value) {
        self.inner
            .set(key, document)
            .await
            .expect("in-memory set");
    }

    pub(crate) async fn raw_get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await.expect("in-memory get")
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("backend offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for FlakyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn set(&self, key: &str, document: Value) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, document).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn get_all(&self) -> Result<Vec<Document>, StoreError> {
        // Snapshot before waiting so a held listing returns stale contents.
        let snapshot = self.inner.get_all().await;
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.hold_listing.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.check()?;
        snapshot
    }
}
