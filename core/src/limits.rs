//! Injected collaborator interfaces with in-memory defaults. Process-wide
//! lifetime, constructor initialization; tests swap in fakes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Coarse per-client request counter. The transport edge owns the real
/// enforcement; the orchestrator consults this to shed load early.
pub trait RateLimiter: Send + Sync {
    fn try_acquire(&self, key: &str) -> bool;
}

/// Fixed one-minute window per key.
pub struct WindowRateLimiter {
    per_minute: u32,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl WindowRateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            window: Duration::from_secs(60),
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for WindowRateLimiter {
    fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = match self.hits.lock() {
            Ok(hits) => hits,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = hits.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);
        if entry.len() >= self.per_minute as usize {
            return false;
        }
        entry.push(now);
        true
    }
}

/// Key for one decorative background asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackgroundKey {
    pub theme: String,
    pub aspect_ratio: String,
    pub primary: String,
    pub accent: String,
}

/// Read path consulted by the decorative-background collaborator.
pub trait BackgroundCache: Send + Sync {
    fn get(&self, key: &BackgroundKey) -> Option<String>;
    fn put(&self, key: BackgroundKey, value: String);
}

/// Bounded LRU over a vec; fine at a capacity of ~50.
pub struct LruBackgroundCache {
    capacity: usize,
    entries: Mutex<Vec<(BackgroundKey, String)>>,
}

pub const DEFAULT_BACKGROUND_CAPACITY: usize = 50;

impl LruBackgroundCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for LruBackgroundCache {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND_CAPACITY)
    }
}

impl BackgroundCache for LruBackgroundCache {
    fn get(&self, key: &BackgroundKey) -> Option<String> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let index = entries.iter().position(|(k, _)| k == key)?;
        let entry = entries.remove(index);
        let value = entry.1.clone();
        entries.push(entry);
        Some(value)
    }

    fn put(&self, key: BackgroundKey, value: String) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(index) = entries.iter().position(|(k, _)| k == &key) {
            entries.remove(index);
        }
        if entries.len() >= self.capacity {
            entries.remove(0);
        }
        entries.push((key, value));
    }
}
