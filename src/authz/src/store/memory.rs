//! In-memory restriction backend

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{RestrictionBackend, RestrictionRecord};
use crate::error::{AuthzError, Result};
use crate::types::PageId;

/// In-memory restriction backend
///
/// Replica and primary are the same map. Failures can be switched on to
/// exercise the degraded paths.
pub struct InMemoryRestrictionBackend {
    records: Arc<RwLock<HashMap<PageId, Option<String>>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryRestrictionBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Store a raw `tag_content` value without going through `upsert`
    pub async fn insert_raw(&self, page_id: PageId, tag_content: Option<&str>) {
        let mut records = self.records.write().await;
        records.insert(page_id, tag_content.map(str::to_string));
    }

    /// Raw `tag_content` for a page, `None` when no record exists
    pub async fn raw(&self, page_id: PageId) -> Option<Option<String>> {
        let records = self.records.read().await;
        records.get(&page_id).cloned()
    }

    /// Make subsequent reads fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of `fetch` calls
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `upsert` calls that reached the map
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryRestrictionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RestrictionBackend for InMemoryRestrictionBackend {
    async fn fetch(&self, page_id: PageId) -> Result<Option<RestrictionRecord>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(AuthzError::StoreReadFailure("replica unavailable".to_string()));
        }

        let records = self.records.read().await;
        Ok(records.get(&page_id).map(|tag_content| RestrictionRecord {
            page_id,
            tag_content: tag_content.clone(),
        }))
    }

    async fn upsert(&self, record: RestrictionRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(AuthzError::StoreWriteFailure("primary unavailable".to_string()));
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut records = self.records.write().await;
        records.insert(record.page_id, record.tag_content);
        Ok(())
    }
}
