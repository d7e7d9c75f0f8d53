//! Process-wide TTL cache with get-or-compute semantics.
//!
//! Entries are created on first miss and replaced on the first read after
//! they expire. Nothing is evicted before expiry. Concurrent misses for the
//! same key may each run the compute step; the last write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

#[derive(Debug, Default)]
pub struct EntityCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unexpired value for `key`, or runs `compute` once and
    /// stores its result with an expiry of now + `ttl` (`None` never expires).
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute`. Nothing is stored in that case.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        debug!(cache_key = %key, "Cache miss");
        let value = compute().await?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(value)
    }

    /// Returns the cached value for `key` if present and unexpired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Drops a single entry so the next read recomputes it.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned map still holds consistent entries; each insert is a single call.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
