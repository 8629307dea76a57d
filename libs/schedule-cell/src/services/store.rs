use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{BlockKind, BlockedDay, BlockedDayForEmployee, BlockedTime, DateBlock, ScheduleEntry};

/// Working-hours rules, keyed by `ScheduleEntry::key`.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_schedule(&self, professional_id: &str) -> Result<Vec<ScheduleEntry>>;

    /// Insert or replace the entry stored under the same key.
    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<()>;

    /// Returns whether an entry existed under `key`.
    async fn delete_entry(&self, key: &str) -> Result<bool>;
}

/// The three kinds of blocks. Writes are keyed upserts, so repeating one
/// leaves a single record.
#[async_trait]
pub trait BlockingStore: Send + Sync {
    async fn get_blocked_days(&self) -> Result<Vec<NaiveDate>>;

    async fn get_blocked_times_and_days(&self, date: NaiveDate) -> Result<Vec<DateBlock>>;

    async fn put_blocked_day(&self, block: &BlockedDay) -> Result<()>;

    async fn put_blocked_day_for_employee(&self, block: &BlockedDayForEmployee) -> Result<()>;

    async fn put_blocked_time(&self, block: &BlockedTime) -> Result<()>;

    async fn delete_block(&self, kind: BlockKind, key: &str) -> Result<bool>;
}
