// libs/schedule-cell/src/services/memory.rs
use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::models::{
    BlockKind, BlockedDay, BlockedDayForEmployee, BlockedTime, DateBlock, ScheduleEntry,
};
use crate::services::store::{BlockingStore, ScheduleStore};

/// Process-local schedule store, used when no Supabase project is configured.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    entries: RwLock<HashMap<String, ScheduleEntry>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = ScheduleEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn get_schedule(&self, professional_id: &str) -> Result<Vec<ScheduleEntry>> {
        let entries = self.entries.read().await;
        let mut schedule: Vec<ScheduleEntry> = entries
            .values()
            .filter(|entry| entry.professional_id == professional_id)
            .cloned()
            .collect();
        schedule.sort_by_key(|entry| entry.key());
        Ok(schedule)
    }

    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        self.entries.write().await.insert(entry.key(), entry.clone());
        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

#[derive(Default)]
struct BlockTables {
    days: BTreeMap<String, BlockedDay>,
    professional_days: BTreeMap<String, BlockedDayForEmployee>,
    times: BTreeMap<String, BlockedTime>,
}

#[derive(Default)]
pub struct InMemoryBlockingStore {
    tables: RwLock<BlockTables>,
}

impl InMemoryBlockingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockingStore for InMemoryBlockingStore {
    async fn get_blocked_days(&self) -> Result<Vec<NaiveDate>> {
        let tables = self.tables.read().await;
        Ok(tables.days.values().map(|block| block.date).collect())
    }

    async fn get_blocked_times_and_days(&self, date: NaiveDate) -> Result<Vec<DateBlock>> {
        let tables = self.tables.read().await;
        let professional_days = tables
            .professional_days
            .values()
            .filter(|block| block.date == date)
            .cloned()
            .map(DateBlock::ProfessionalDay);
        let times = tables
            .times
            .values()
            .filter(|block| block.date == date)
            .cloned()
            .map(DateBlock::Time);
        Ok(professional_days.chain(times).collect())
    }

    async fn put_blocked_day(&self, block: &BlockedDay) -> Result<()> {
        self.tables.write().await.days.insert(block.key(), *block);
        Ok(())
    }

    async fn put_blocked_day_for_employee(&self, block: &BlockedDayForEmployee) -> Result<()> {
        self.tables
            .write()
            .await
            .professional_days
            .insert(block.key(), block.clone());
        Ok(())
    }

    async fn put_blocked_time(&self, block: &BlockedTime) -> Result<()> {
        self.tables.write().await.times.insert(block.key(), block.clone());
        Ok(())
    }

    async fn delete_block(&self, kind: BlockKind, key: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = match kind {
            BlockKind::Day => tables.days.remove(key).is_some(),
            BlockKind::ProfessionalDay => tables.professional_days.remove(key).is_some(),
            BlockKind::Time => tables.times.remove(key).is_some(),
        };
        Ok(removed)
    }
}
