//! Keyed cooldown set used to park rate-limited mirrors.
//!
//! Entries expire on their own; `has` never reports a key whose TTL has run
//! out according to the injected clock.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

pub trait CooldownCache: Send + Sync {
    fn has(&self, key: &str) -> bool;
    fn set(&self, key: &str, ttl: Duration);
}

pub struct MemoryCooldownCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryCooldownCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }
}

impl CooldownCache for MemoryCooldownCache {
    fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    fn set(&self, key: &str, ttl: Duration) {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        log::debug!("Cooling down '{}' until {}", key, expires_at);
        self.entries.lock().insert(key.to_string(), expires_at);
    }
}
