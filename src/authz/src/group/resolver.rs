/// Group resolver with TTL caching
///
/// Resolves a specifier's group page to the three disjoint user sets it
/// grants, applying the specifier's scope modifier.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::source::PageSource;
use crate::error::GroupResolutionError;
use crate::specifier::{parse_group_page, ScopeModifier, Specifier, Title};
use crate::types::{Tier, User, WILDCARD_USER};

/// Default cache TTL (5 minutes)
pub const DEFAULT_GROUP_TTL: Duration = Duration::from_secs(300);

/// Outcome of resolving one specifier
pub type Resolution = Result<Arc<GroupClassification>, GroupResolutionError>;

/// Users granted access through one specifier, partitioned by tier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupClassification {
    /// Users with full edit access
    pub write_users: BTreeSet<String>,
    /// Users with read-only access
    pub read_users: BTreeSet<String>,
    /// Users with search-snippet access
    pub search_users: BTreeSet<String>,
}

impl GroupClassification {
    /// Classification that grants nobody anything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Partition a group page's members, capped by `modifier`
    pub fn from_members(members: &BTreeMap<String, Tier>, modifier: ScopeModifier) -> Self {
        let mut classification = Self::default();

        for (name, tier) in members {
            let set = match modifier.restrict(*tier) {
                Tier::Write => &mut classification.write_users,
                Tier::Read => &mut classification.read_users,
                Tier::Search => &mut classification.search_users,
                Tier::None => continue,
            };
            set.insert(name.clone());
        }

        classification
    }

    /// Tier granted to an exact username
    pub fn tier_of(&self, name: &str) -> Tier {
        if self.write_users.contains(name) {
            Tier::Write
        } else if self.read_users.contains(name) {
            Tier::Read
        } else if self.search_users.contains(name) {
            Tier::Search
        } else {
            Tier::None
        }
    }

    /// Tier granted to `user`, counting wildcard entries
    pub fn tier_for(&self, user: &User) -> Tier {
        self.tier_of(user.match_name()).max(self.tier_of(WILDCARD_USER))
    }

    /// Total number of entries across all tiers
    pub fn len(&self) -> usize {
        self.write_users.len() + self.read_users.len() + self.search_users.len()
    }

    /// Whether no one is granted anything
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Cached outcome
    resolution: Resolution,
    /// Group page the outcome was derived from, when the title parsed
    title: Option<Title>,
    /// Timestamp when entry was created
    created_at: Instant,
}

impl CacheEntry {
    fn new(resolution: Resolution, title: Option<Title>) -> Self {
        Self {
            resolution,
            title,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Statistics about cache performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Number of expired entries encountered
    pub expirations: usize,
    /// Total number of entries in cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Resolves specifiers to group classifications
///
/// Outcomes (including malformed-title and missing-page errors) are cached
/// by the original specifier string, so `(ro)Foo` and `Foo` are separate
/// entries. Entries expire after the configured TTL and can be dropped
/// early with [`GroupResolver::invalidate_title`] when a group page changes.
///
/// # Examples
///
/// ```
/// use accesscontrol_authz::group::{GroupResolver, InMemoryPageSource};
/// use accesscontrol_authz::Tier;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = Arc::new(InMemoryPageSource::new());
/// source.insert("Editors", "* Alice\n* Bob (ro)").await?;
///
/// let resolver = GroupResolver::new(source);
/// let classification = resolver.resolve("(ro)Editors").await?;
/// assert_eq!(classification.tier_of("Alice"), Tier::Read);
/// # Ok(())
/// # }
/// ```
pub struct GroupResolver {
    /// Title/content collaborator
    source: Arc<dyn PageSource>,
    /// Cache keyed by original specifier text
    cache: Arc<DashMap<String, CacheEntry>>,
    /// Cache TTL duration
    ttl: Duration,
    /// Cache statistics
    stats: Arc<DashMap<&'static str, usize>>,
}

impl GroupResolver {
    /// Creates a resolver with the default TTL
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self::with_ttl(source, DEFAULT_GROUP_TTL)
    }

    /// Creates a resolver with a custom TTL
    pub fn with_ttl(source: Arc<dyn PageSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: Arc::new(DashMap::new()),
            ttl,
            stats: Arc::new(DashMap::new()),
        }
    }

    /// Resolve a raw specifier to its classification
    pub async fn resolve(&self, raw: &str) -> Resolution {
        if let Some(resolution) = self.cached(raw) {
            return resolution;
        }

        let (resolution, title) = self.resolve_uncached(raw).await;

        match &resolution {
            Err(e) if !e.is_cacheable() => {
                warn!("Group resolution for '{}' failed, not caching: {}", raw, e);
            }
            _ => {
                self.cache
                    .insert(raw.to_string(), CacheEntry::new(resolution.clone(), title));
            }
        }

        resolution
    }

    /// Looks up a live cache entry
    fn cached(&self, raw: &str) -> Option<Resolution> {
        let expired = match self.cache.get(raw) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                self.increment_stat("hits");
                debug!("Group cache hit for '{}'", raw);
                return Some(entry.resolution.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.cache.remove(raw);
            self.increment_stat("expirations");
        }
        self.increment_stat("misses");
        None
    }

    /// Resolves without consulting the cache
    async fn resolve_uncached(&self, raw: &str) -> (Resolution, Option<Title>) {
        let specifier = match Specifier::new(raw) {
            Ok(specifier) => specifier,
            Err(e) => return (Err(e), None),
        };
        let title = specifier.title().clone();

        let content = match self.source.fetch(&title).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                return (
                    Err(GroupResolutionError::GroupPageNotFound(title.to_string())),
                    Some(title),
                )
            }
            Err(e) => return (Err(e.into()), Some(title)),
        };

        let members = parse_group_page(&content);
        let classification = GroupClassification::from_members(&members, specifier.modifier());

        debug!(
            "Resolved '{}' via '{}': {} write, {} read, {} search",
            raw,
            title,
            classification.write_users.len(),
            classification.read_users.len(),
            classification.search_users.len()
        );

        (Ok(Arc::new(classification)), Some(title))
    }

    /// Drops every cached outcome derived from `title`.
    ///
    /// Call when a group page is created, edited or deleted. Returns the
    /// number of entries removed.
    pub fn invalidate_title(&self, title: &Title) -> usize {
        let before = self.cache.len();
        self.cache
            .retain(|_, entry| entry.title.as_ref() != Some(title));
        let removed = before.saturating_sub(self.cache.len());

        if removed > 0 {
            info!("Invalidated {} group cache entries for '{}'", removed, title);
        }
        removed
    }

    /// Clears the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.stats.clear();
    }

    /// Removes expired entries from the cache
    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.cache.retain(|_, entry| !entry.is_expired(ttl));
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.cache.len(),
        }
    }

    /// Returns the current cache TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
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
