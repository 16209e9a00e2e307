//! Channel pattern cache with TTL.
//!
//! Entries are immutable once written; writers replace them wholesale and
//! readers check the TTL before trusting an entry. Expired entries are
//! reported as absent but not purged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vthumb_models::ChannelPattern;

/// Time source, injectable so tests control expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|by| now.checked_add_signed(by))
        {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cached analysis and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub pattern: ChannelPattern,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.timestamp) < ttl,
            // A TTL too large to represent never expires
            Err(_) => true,
        }
    }
}

#[async_trait]
pub trait PatternCache: Send + Sync {
    /// Fresh entry for `channel_id`, if any.
    async fn get(&self, channel_id: &str) -> Option<ChannelPattern>;

    /// Store or replace the entry for `channel_id`.
    async fn put(&self, channel_id: &str, pattern: ChannelPattern);
}

/// Process-wide in-memory cache.
pub struct InMemoryPatternCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemoryPatternCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }
}

#[async_trait]
impl PatternCache for InMemoryPatternCache {
    async fn get(&self, channel_id: &str) -> Option<ChannelPattern> {
        let entries = self.entries.read().await;
        let entry = entries.get(channel_id)?;
        if entry.is_fresh(self.clock.now(), self.ttl) {
            Some(entry.pattern.clone())
        } else {
            None
        }
    }

    async fn put(&self, channel_id: &str, pattern: ChannelPattern) {
        let entry = CacheEntry {
            pattern,
            timestamp: self.clock.now(),
        };
        self.entries
            .write()
            .await
            .insert(channel_id.to_string(), entry);
    }
}
