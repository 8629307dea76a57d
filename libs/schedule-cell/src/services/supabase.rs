// libs/schedule-cell/src/services/supabase.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::{prefer, SupabaseClient};

use crate::models::{
    date_key, BlockKind, BlockedDay, BlockedDayForEmployee, BlockedTime, DateBlock, ScheduleEntry,
};
use crate::services::store::{BlockingStore, ScheduleStore};

const SCHEDULES_TABLE: &str = "schedules";
const BLOCKED_DAYS_TABLE: &str = "blocked_days";
const BLOCKED_DAYS_EMPLOYEE_TABLE: &str = "blocked_days_employee";
const BLOCKED_TIMES_TABLE: &str = "blocked_times";

const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=minimal";

/// Decodes rows one at a time so a single malformed row is skipped instead of
/// failing the whole read.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} row {}: {}", table, row, e);
                None
            }
        })
        .collect()
}

/// Serializes a record and stamps it with its identity key as `id`.
pub fn row_with_id<T: Serialize>(record: &T, id: &str) -> Result<Value> {
    let mut row = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut row {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
    Ok(row)
}

async fn upsert(supabase: &SupabaseClient, table: &str, row: Value) -> Result<()> {
    supabase
        .execute(
            Method::POST,
            &format!("/rest/v1/{}?on_conflict=id", table),
            None,
            Some(row),
            Some(prefer(UPSERT_PREFERENCE)?),
        )
        .await
        .with_context(|| format!("Failed to upsert into {}", table))
}

async fn delete_by_id(supabase: &SupabaseClient, table: &str, id: &str) -> Result<bool> {
    let path = format!("/rest/v1/{}?id=eq.{}", table, urlencoding::encode(id));
    let deleted: Vec<Value> = supabase
        .request_with_headers(
            Method::DELETE,
            &path,
            None,
            None,
            Some(prefer("return=representation")?),
        )
        .await
        .with_context(|| format!("Failed to delete {} from {}", id, table))?;
    Ok(!deleted.is_empty())
}

pub struct SupabaseScheduleStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseScheduleStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ScheduleStore for SupabaseScheduleStore {
    async fn get_schedule(&self, professional_id: &str) -> Result<Vec<ScheduleEntry>> {
        debug!("Fetching schedule for professional: {}", professional_id);

        let path = format!(
            "/rest/v1/{}?professional_id=eq.{}&order=id.asc",
            SCHEDULES_TABLE,
            urlencoding::encode(professional_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .context("Failed to fetch schedule")?;

        let entries = decode_rows::<ScheduleEntry>(SCHEDULES_TABLE, rows)
            .into_iter()
            .filter(|entry| match entry.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping invalid schedule entry {}: {}", entry.key(), e);
                    false
                }
            })
            .collect();
        Ok(entries)
    }

    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        upsert(&self.supabase, SCHEDULES_TABLE, row_with_id(entry, &entry.key())?).await
    }

    async fn delete_entry(&self, key: &str) -> Result<bool> {
        delete_by_id(&self.supabase, SCHEDULES_TABLE, key).await
    }
}

pub struct SupabaseBlockingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBlockingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn rows_on(&self, table: &str, date: NaiveDate) -> Result<Vec<Value>> {
        let path = format!("/rest/v1/{}?date=eq.{}", table, date_key(date));
        self.supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to fetch {} for {}", table, date))
    }
}

#[async_trait]
impl BlockingStore for SupabaseBlockingStore {
    async fn get_blocked_days(&self) -> Result<Vec<NaiveDate>> {
        let path = format!("/rest/v1/{}?order=date.asc", BLOCKED_DAYS_TABLE);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .context("Failed to fetch blocked days")?;

        Ok(decode_rows::<BlockedDay>(BLOCKED_DAYS_TABLE, rows)
            .into_iter()
            .map(|block| block.date)
            .collect())
    }

    async fn get_blocked_times_and_days(&self, date: NaiveDate) -> Result<Vec<DateBlock>> {
        let (day_rows, time_rows) = tokio::try_join!(
            self.rows_on(BLOCKED_DAYS_EMPLOYEE_TABLE, date),
            self.rows_on(BLOCKED_TIMES_TABLE, date),
        )?;

        let days = decode_rows::<BlockedDayForEmployee>(BLOCKED_DAYS_EMPLOYEE_TABLE, day_rows)
            .into_iter()
            .map(DateBlock::ProfessionalDay);
        let times = decode_rows::<BlockedTime>(BLOCKED_TIMES_TABLE, time_rows)
            .into_iter()
            .map(DateBlock::Time);

        Ok(days.chain(times).collect())
    }

    async fn put_blocked_day(&self, block: &BlockedDay) -> Result<()> {
        upsert(&self.supabase, BLOCKED_DAYS_TABLE, row_with_id(block, &block.key())?).await
    }

    async fn put_blocked_day_for_employee(&self, block: &BlockedDayForEmployee) -> Result<()> {
        upsert(
            &self.supabase,
            BLOCKED_DAYS_EMPLOYEE_TABLE,
            row_with_id(block, &block.key())?,
        )
        .await
    }

    async fn put_blocked_time(&self, block: &BlockedTime) -> Result<()> {
        upsert(&self.supabase, BLOCKED_TIMES_TABLE, row_with_id(block, &block.key())?).await
    }

    async fn delete_block(&self, kind: BlockKind, key: &str) -> Result<bool> {
        let table = match kind {
            BlockKind::Day => BLOCKED_DAYS_TABLE,
            BlockKind::ProfessionalDay => BLOCKED_DAYS_EMPLOYEE_TABLE,
            BlockKind::Time => BLOCKED_TIMES_TABLE,
        };
        delete_by_id(&self.supabase, table, key).await
    }
}
