//! Page restriction storage
//!
//! Two levels: a process-local LRU cache with TTL in front of a persistent
//! record per page. Reads go to a replica, writes upsert on the primary.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryRestrictionBackend;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRestrictionBackend;

use async_trait::async_trait;
use dashmap::DashMap;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::render::DeclarationRenderer;
use crate::types::PageId;

/// Specifier list attached to a page; `None` means unrestricted
pub type Restriction = Option<Vec<String>>;

/// Persistent row: `page_id` primary key, nullable JSON `tag_content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRecord {
    pub page_id: PageId,
    pub tag_content: Option<String>,
}

impl RestrictionRecord {
    /// Encode a restriction into a record
    pub fn encode(page_id: PageId, restriction: &Restriction) -> Result<Self> {
        let tag_content = match restriction {
            Some(specifiers) if !specifiers.is_empty() => Some(serde_json::to_string(specifiers)?),
            _ => None,
        };

        Ok(Self {
            page_id,
            tag_content,
        })
    }

    /// Decode the stored restriction; empty content means unrestricted
    pub fn decode(&self) -> Result<Restriction> {
        let content = match self.tag_content.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(content) => content,
        };

        let specifiers: Vec<String> = serde_json::from_str(content)?;
        Ok(if specifiers.is_empty() { None } else { Some(specifiers) })
    }
}

/// Persistent store collaborator
#[async_trait]
pub trait RestrictionBackend: Send + Sync {
    /// Read a page's record from a read replica. Staleness is tolerated.
    async fn fetch(&self, page_id: PageId) -> Result<Option<RestrictionRecord>>;

    /// Insert or replace a page's record on the primary
    async fn upsert(&self, record: RestrictionRecord) -> Result<()>;
}

/// Restriction cache configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of cached pages
    pub capacity: usize,

    /// Time-to-live for cached restrictions
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Duration::from_secs(60),
        }
    }
}

/// Outcome of a write-path update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cache already held the same value, nothing written
    Unchanged,
    /// Record upserted on the primary
    Persisted,
    /// Page has no identity yet
    Skipped,
    /// Primary rejected the write; the update is lost until the next reprocessing
    Failed,
}

/// Cached restriction with TTL
#[derive(Clone)]
struct CachedEntry {
    restriction: Restriction,
    /// Value is known to match the persistent record
    persisted: bool,
    cached_at: Instant,
}

impl CachedEntry {
    fn new(restriction: Restriction, persisted: bool) -> Self {
        Self {
            restriction,
            persisted,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Restriction store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub hits: usize,
    pub misses: usize,
    pub cold_renders: usize,
    pub read_failures: usize,
    pub writes: usize,
    pub unchanged_writes: usize,
    pub write_failures: usize,
    pub entries: usize,
}

impl StoreStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Two-level page restriction store
///
/// # Read path
///
/// cache → replica record → cold render. The cold path re-derives the
/// restriction from a fresh render when no record exists yet; its result is
/// cached but never persisted.
///
/// # Write path
///
/// Skipped when the cache holds the same value and that value came from (or
/// was written to) the backend. Otherwise upserted on the primary and cached.
pub struct RestrictionStore {
    /// Persistent records
    backend: Arc<dyn RestrictionBackend>,

    /// Rendering collaborator for the cold path
    renderer: Arc<dyn DeclarationRenderer>,

    /// Process-local cache
    cache: Mutex<LruCache<PageId, CachedEntry>>,

    /// Cache configuration
    config: StoreConfig,

    /// Statistics
    stats: DashMap<&'static str, usize>,
}

impl RestrictionStore {
    /// Create a store over a backend and renderer
    pub fn new(
        backend: Arc<dyn RestrictionBackend>,
        renderer: Arc<dyn DeclarationRenderer>,
        config: StoreConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            backend,
            renderer,
            cache: Mutex::new(LruCache::new(capacity)),
            config,
            stats: DashMap::new(),
        }
    }

    /// Restriction for `page_id`.
    ///
    /// Page id `0` (not yet created) is unrestricted. Errors only when the
    /// cold-path render fails, so callers can fail closed.
    pub async fn get(&self, page_id: PageId) -> Result<Restriction> {
        if page_id == 0 {
            return Ok(None);
        }

        if let Some(entry) = self.cached(page_id).await {
            self.increment_stat("hits");
            debug!("Restriction cache hit for page {}", page_id);
            return Ok(entry.restriction);
        }
        self.increment_stat("misses");

        match self.backend.fetch(page_id).await {
            Ok(Some(record)) => match record.decode() {
                Ok(restriction) => {
                    self.remember(page_id, restriction.clone(), true).await;
                    return Ok(restriction);
                }
                Err(e) => {
                    self.increment_stat("read_failures");
                    warn!("Undecodable restriction record for page {}: {}", page_id, e);
                }
            },
            Ok(None) => {
                debug!("No restriction record for page {}, rendering", page_id);
            }
            Err(e) => {
                self.increment_stat("read_failures");
                warn!("Restriction read for page {} failed, rendering: {}", page_id, e);
            }
        }

        self.increment_stat("cold_renders");
        let restriction = self.renderer.render_declarations(page_id).await?.into_restriction();
        self.remember(page_id, restriction.clone(), false).await;

        Ok(restriction)
    }

    /// Record the freshly rendered restriction for `page_id`
    pub async fn put(&self, page_id: PageId, restriction: Restriction) -> WriteOutcome {
        if page_id == 0 {
            return WriteOutcome::Skipped;
        }

        let restriction = restriction.filter(|specifiers| !specifiers.is_empty());

        let unchanged = self
            .cached(page_id)
            .await
            .is_some_and(|entry| entry.persisted && entry.restriction == restriction);

        if unchanged {
            self.increment_stat("unchanged_writes");
            debug!("Restriction for page {} unchanged, skipping write", page_id);
            return WriteOutcome::Unchanged;
        }

        let written = match RestrictionRecord::encode(page_id, &restriction) {
            Ok(record) => self.backend.upsert(record).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => {
                self.remember(page_id, restriction.clone(), true).await;
                self.increment_stat("writes");
                info!("Persisted restriction for page {}: {:?}", page_id, restriction);
                WriteOutcome::Persisted
            }
            Err(e) => {
                self.increment_stat("write_failures");
                warn!("Restriction write for page {} failed: {}", page_id, e);
                // Drop the old value so reads go back to the backend
                self.invalidate(page_id).await;
                WriteOutcome::Failed
            }
        }
    }

    /// Drop the cached restriction for `page_id`
    pub async fn invalidate(&self, page_id: PageId) {
        let mut cache = self.cache.lock().await;
        cache.pop(&page_id);
    }

    /// Clear the entire cache
    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.clear();
        self.stats.clear();
    }

    /// Get store statistics
    pub async fn stats(&self) -> StoreStats {
        let entries = self.cache.lock().await.len();

        StoreStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            cold_renders: self.get_stat("cold_renders"),
            read_failures: self.get_stat("read_failures"),
            writes: self.get_stat("writes"),
            unchanged_writes: self.get_stat("unchanged_writes"),
            write_failures: self.get_stat("write_failures"),
            entries,
        }
    }

    async fn cached(&self, page_id: PageId) -> Option<CachedEntry> {
        let mut cache = self.cache.lock().await;

        let expired = match cache.get(&page_id) {
            Some(entry) if !entry.is_expired(self.config.ttl) => return Some(entry.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(&page_id);
        }
        None
    }

    async fn remember(&self, page_id: PageId, restriction: Restriction, persisted: bool) {
        let mut cache = self.cache.lock().await;
        cache.put(page_id, CachedEntry::new(restriction, persisted));
    }

    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}
