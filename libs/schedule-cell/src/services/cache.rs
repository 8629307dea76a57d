// libs/schedule-cell/src/services/cache.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::ScheduleEntry;
use crate::services::store::ScheduleStore;

struct CachedSchedule {
    entries: Vec<ScheduleEntry>,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    schedules: HashMap<String, CachedSchedule>,
    /// Bumped on every invalidation. A miss only stores its result if the
    /// generation it started under is still current.
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, professional_id: &str) -> u64 {
        self.generations.get(professional_id).copied().unwrap_or(0)
    }
}

/// Read-through cache in front of a schedule store, one entry per
/// professional.
pub struct CachedScheduleStore {
    inner: Arc<dyn ScheduleStore>,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl CachedScheduleStore {
    pub fn new(inner: Arc<dyn ScheduleStore>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub async fn invalidate(&self, professional_id: &str) {
        let mut state = self.state.write().await;
        state.schedules.remove(professional_id);
        *state.generations.entry(professional_id.to_string()).or_default() += 1;
    }
}

#[async_trait]
impl ScheduleStore for CachedScheduleStore {
    async fn get_schedule(&self, professional_id: &str) -> Result<Vec<ScheduleEntry>> {
        let generation = {
            let state = self.state.read().await;
            if let Some(cached) = state.schedules.get(professional_id) {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!("Schedule cache hit for {}", professional_id);
                    return Ok(cached.entries.clone());
                }
            }
            state.generation(professional_id)
        };

        let entries = self.inner.get_schedule(professional_id).await?;

        let mut state = self.state.write().await;
        if state.generation(professional_id) == generation {
            state.schedules.insert(
                professional_id.to_string(),
                CachedSchedule {
                    entries: entries.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            debug!("Schedule for {} changed during read, not caching", professional_id);
        }
        Ok(entries)
    }

    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        self.inner.save_entry(entry).await?;
        self.invalidate(&entry.professional_id).await;
        Ok(())
    }

    /// Keys start with the professional id, so that prefix is invalidated.
    async fn delete_entry(&self, key: &str) -> Result<bool> {
        let removed = self.inner.delete_entry(key).await?;
        if let Some((professional_id, _)) = key.split_once(crate::models::KEY_DELIMITER) {
            self.invalidate(professional_id).await;
        }
        Ok(removed)
    }
}
