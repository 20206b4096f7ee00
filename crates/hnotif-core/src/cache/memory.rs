//! In-memory freshness cache implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::domain::ItemId;
use crate::ports::FreshnessCache;

/// In-memory cache state.
///
/// Value = posted_at of the item at the moment it was cached.
#[derive(Debug, Default)]
struct InMemoryCacheState {
    entries: HashMap<ItemId, DateTime<Utc>>,
}

impl InMemoryCacheState {
    fn evict_older_than(&mut self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let before = self.entries.len();
        self.entries
            .retain(|_, posted_at| now.signed_duration_since(*posted_at) < max_age);
        before - self.entries.len()
    }
}

/// In-memory freshness cache.
///
/// Design:
/// - One mutex guards the whole map; every operation takes it once.
/// - The lock is never held across an await outside this type.
/// - Clone shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFreshnessCache {
    state: Arc<Mutex<InMemoryCacheState>>,
}

impl InMemoryFreshnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `id` (for testing)
    #[cfg(test)]
    pub async fn get(&self, id: ItemId) -> Option<DateTime<Utc>> {
        let state = self.state.lock().await;
        state.entries.get(&id).copied()
    }
}

#[async_trait]
impl FreshnessCache for InMemoryFreshnessCache {
    async fn contains(&self, id: ItemId) -> bool {
        let state = self.state.lock().await;
        state.entries.contains_key(&id)
    }

    async fn put(&self, id: ItemId, posted_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.entries.insert(id, posted_at);
    }

    async fn evict_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock().await;
        state.evict_older_than(max_age, now)
    }

    async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.entries.len()
    }
}
