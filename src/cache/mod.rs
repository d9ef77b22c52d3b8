//! In-memory response cache.
//!
//! [`ResponseCache`] maps a request signature to a cached value with an
//! expiry. Entries are created on successful GET requests and destroyed when
//! read after expiry, when invalidated, or when the store grows past its
//! maximum size (oldest entries first).
//!
//! The cache is best effort: if its internal lock is poisoned every read
//! degrades to a miss and every write to a no-op.
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::cache::{CacheConfig, ResponseCache};
//! use fluent_rest::HttpMethod;
//! use std::collections::BTreeMap;
//!
//! let cache: ResponseCache<String> = ResponseCache::new(CacheConfig::default());
//! let params = BTreeMap::new();
//!
//! cache.set(HttpMethod::Get, "https://api.example.com/users", "alice".to_string(), &params, None);
//! assert_eq!(
//!     cache.get(HttpMethod::Get, "https://api.example.com/users", &params),
//!     Some("alice".to_string())
//! );
//!
//! cache.invalidate(Some("/users"));
//! assert!(cache.is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::clients::HttpMethod;

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached responses.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Cache settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// When `false`, reads always miss and writes are ignored.
    pub enabled: bool,
    /// TTL used when `set` is called without an override.
    pub default_ttl: Duration,
    /// Entry count above which the oldest entries are evicted.
    pub max_size: usize,
}

impl CacheConfig {
    /// Returns a config with caching turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: DEFAULT_TTL,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// A cached value and its expiry.
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// When the entry stops being valid.
    pub expires_at: Instant,
    inserted: u64,
}

impl<T> CacheEntry<T> {
    /// Returns `true` if the entry is still valid at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a value.
    pub hits: u64,
    /// Reads that returned nothing (including expired entries).
    pub misses: u64,
    /// Entries removed by size-based cleanup.
    pub evictions: u64,
    /// Entries removed because they had expired.
    pub expirations: u64,
}

/// Builds the deterministic cache key for a request.
///
/// The key is `"{METHOD}:{url}:{params}"` where `params` is the JSON form of
/// the (already sorted) parameter map.
///
/// ```rust
/// use fluent_rest::cache::signature;
/// use fluent_rest::HttpMethod;
/// use std::collections::BTreeMap;
///
/// let mut params = BTreeMap::new();
/// params.insert("per_page".to_string(), "50".to_string());
/// assert_eq!(
///     signature(HttpMethod::Get, "https://api.github.com/users", &params),
///     r#"GET:https://api.github.com/users:{"per_page":"50"}"#
/// );
/// ```
#[must_use]
pub fn signature(method: HttpMethod, url: &str, params: &BTreeMap<String, String>) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    format!("{}:{url}:{params}", method.as_str())
}

#[derive(Debug)]
struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    next_insert: u64,
    stats: CacheStats,
}

/// Signature-keyed response cache with TTL expiry and size-bounded eviction.
///
/// `ResponseCache` is `Send + Sync` for `T: Send`. Every operation completes
/// under a single lock acquisition, so a read can never observe an entry
/// that a concurrent cleanup has already evicted.
#[derive(Debug)]
pub struct ResponseCache<T> {
    config: CacheConfig,
    inner: Mutex<CacheInner<T>>,
}

impl<T: Clone> ResponseCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                next_insert: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Returns the cache configuration.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> Option<MutexGuard<'_, CacheInner<T>>> {
        match self.inner.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::warn!("Response cache lock poisoned; treating as a miss");
                None
            }
        }
    }

    /// Looks up a cached value.
    ///
    /// Returns `None` when the cache is disabled, the key is missing, or the
    /// entry has expired. Expired entries are deleted.
    #[must_use]
    pub fn get(&self, method: HttpMethod, url: &str, params: &BTreeMap<String, String>) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        self.get_by_key(&signature(method, url, params))
    }

    /// Looks up a cached value by its signature.
    #[must_use]
    pub fn get_by_key(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        let mut inner = self.lock()?;
        let now = Instant::now();

        let fresh = inner.entries.get(key).map(|entry| entry.is_fresh(now));
        match fresh {
            Some(true) => {
                inner.stats.hits += 1;
                inner.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                inner.entries.remove(key);
                inner.stats.expirations += 1;
                inner.stats.misses += 1;
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Stores a value for `ttl_override`, or the default TTL when `None`.
    ///
    /// Triggers cleanup when the store grows past `max_size`.
    pub fn set(
        &self,
        method: HttpMethod,
        url: &str,
        value: T,
        params: &BTreeMap<String, String>,
        ttl_override: Option<Duration>,
    ) {
        if !self.config.enabled {
            return;
        }
        let ttl = ttl_override.unwrap_or(self.config.default_ttl);
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            tracing::warn!("Cache TTL {:?} is out of range, not caching {}", ttl, url);
            return;
        };
        let Some(mut inner) = self.lock() else {
            return;
        };
        let inserted = inner.next_insert;
        inner.next_insert += 1;
        inner.entries.insert(
            signature(method, url, params),
            CacheEntry {
                value,
                expires_at,
                inserted,
            },
        );

        if inner.entries.len() > self.config.max_size {
            self.cleanup(&mut inner);
        }
    }

    /// Evicts the oldest entries: a fifth of capacity, or more if needed to
    /// get back under `max_size`.
    fn cleanup(&self, inner: &mut CacheInner<T>) {
        let len = inner.entries.len();
        let fifth = ((self.config.max_size + 4) / 5).max(1);
        let count = fifth.max(len.saturating_sub(self.config.max_size)).min(len);

        let mut by_age: Vec<(u64, String)> = inner
            .entries
            .iter()
            .map(|(key, entry)| (entry.inserted, key.clone()))
            .collect();
        by_age.sort_unstable_by_key(|(inserted, _)| *inserted);

        for (_, key) in by_age.into_iter().take(count) {
            inner.entries.remove(&key);
        }
        inner.stats.evictions += count as u64;
        tracing::debug!("Response cache evicted {} oldest entries", count);
    }

    /// Removes every entry whose key contains `pattern`, or all entries when
    /// `pattern` is `None`. Returns the number of entries removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let Some(mut inner) = self.lock() else {
            return 0;
        };
        let before = inner.entries.len();
        match pattern {
            Some(pattern) => inner.entries.retain(|key, _| !key.contains(pattern)),
            None => inner.entries.clear(),
        }
        before - inner.entries.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.invalidate(None);
    }

    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let Some(mut inner) = self.lock() else {
            return 0;
        };
        let now = Instant::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before - inner.entries.len();
        inner.stats.expirations += removed as u64;
        removed
    }

    /// Returns `true` if an entry exists for `key`, expired or not.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock()
            .is_some_and(|inner| inner.entries.contains_key(key))
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |inner| inner.entries.len())
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().map(|inner| inner.stats).unwrap_or_default()
    }
}

impl<T: Clone> Default for ResponseCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
