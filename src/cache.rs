//! # Cache Module
//!
//! Single-slot TTL caches for API payloads. The engine owns two instances:
//! one for the live quota payload and one for billing history, each with its
//! own lifetime. Time is read through an injected [`Clock`] so expiry is
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// TTL for the primary quota-status payload
pub const QUOTA_TTL_SECONDS: i64 = 8;

/// TTL for the billing-record set used by the aggregator
pub const BILLING_TTL_SECONDS: i64 = 30;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cached payload with the time it was fetched
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: Arc<T>,
    pub fetched_at: DateTime<Utc>,
}

/// One cached value per instance; a `put` overwrites whatever was there.
pub struct TtlCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// An entry is expired once its age reaches the TTL.
    pub fn is_expired(entry: &CacheEntry<T>, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - entry.fetched_at >= ttl
    }

    /// Get the cached payload for `key` if present and still fresh
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let now = self.clock.now();
        let slot = self.slot.lock().ok()?;
        let entry = slot.as_ref()?;
        if entry.key != key {
            tracing::debug!(cached = %entry.key, requested = key, "cache key mismatch");
            return None;
        }
        if Self::is_expired(entry, now, self.ttl) {
            tracing::debug!(key, "cache entry expired");
            return None;
        }
        Some(Arc::clone(&entry.payload))
    }

    /// Store a payload fetched now
    pub fn put(&self, key: &str, payload: T) -> Arc<T> {
        let now = self.clock.now();
        self.put_at(key, payload, now)
    }

    /// Store a payload with an explicit fetch time
    pub fn put_at(&self, key: &str, payload: T, fetched_at: DateTime<Utc>) -> Arc<T> {
        let payload = Arc::new(payload);
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(CacheEntry {
                key: key.to_string(),
                payload: Arc::clone(&payload),
                fetched_at,
            });
        }
        payload
    }

    /// Drop the cached value
    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}
