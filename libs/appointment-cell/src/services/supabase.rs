use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use schedule_cell::date_key;
use schedule_cell::services::supabase::decode_rows;
use shared_config::AppConfig;
use shared_database::supabase::{in_filter, prefer, SupabaseClient};

use crate::models::{Appointment, AppointmentStatus};
use crate::services::store::{AppointmentStore, CommitOutcome};

const APPOINTMENTS_TABLE: &str = "appointments";

/// PostgREST-backed appointment store. The `id` column is the primary key,
/// so a batch POST is one statement that either inserts every row or fails
/// with `409` on the first duplicate.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn existing_ids(&self, ids: &[&str]) -> Result<HashSet<String>> {
        let path = format!(
            "/rest/v1/{}?select=id&id={}",
            APPOINTMENTS_TABLE,
            urlencoding::encode(&in_filter(ids))
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .context("Failed to read appointment keys")?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    async fn first_taken(&self, batch: &[Appointment]) -> Result<Option<String>> {
        let ids: Vec<&str> = batch.iter().map(|a| a.id.as_str()).collect();
        let existing = self.existing_ids(&ids).await?;
        Ok(ids
            .into_iter()
            .find(|id| existing.contains(*id))
            .map(str::to_string))
    }

    fn by_id(id: &str) -> String {
        format!("/rest/v1/{}?id=eq.{}", APPOINTMENTS_TABLE, urlencoding::encode(id))
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get_appointments(&self, date: NaiveDate, professional_id: &str) -> Result<Vec<Appointment>> {
        debug!("Fetching appointments for {} on {}", professional_id, date);

        let path = format!(
            "/rest/v1/{}?date=eq.{}&professional_id=eq.{}&order=time.asc",
            APPOINTMENTS_TABLE,
            date_key(date),
            urlencoding::encode(professional_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .context("Failed to fetch appointments")?;

        Ok(decode_rows(APPOINTMENTS_TABLE, rows))
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &Self::by_id(id), None, None)
            .await
            .context("Failed to fetch appointment")?;

        Ok(decode_rows::<Appointment>(APPOINTMENTS_TABLE, rows).into_iter().next())
    }

    async fn create_all(&self, batch: &[Appointment]) -> Result<CommitOutcome> {
        if batch.is_empty() {
            return Ok(CommitOutcome::Committed);
        }

        if let Some(key) = self.first_taken(batch).await? {
            return Ok(CommitOutcome::Conflict { key });
        }

        let rows = serde_json::to_value(batch)?;
        let inserted = self
            .supabase
            .execute(
                Method::POST,
                &format!("/rest/v1/{}", APPOINTMENTS_TABLE),
                None,
                Some(rows),
                Some(prefer("return=minimal")?),
            )
            .await;

        match inserted {
            Ok(()) => Ok(CommitOutcome::Committed),
            Err(e) if e.is_conflict() => {
                warn!("Concurrent booking won the race: {}", e);
                let key = self
                    .first_taken(batch)
                    .await?
                    .ok_or_else(|| anyhow!("Insert rejected as duplicate but no existing key was found"))?;
                Ok(CommitOutcome::Conflict { key })
            }
            Err(e) => Err(e).context("Failed to insert appointments"),
        }
    }

    async fn update_status(&self, id: &str, from: AppointmentStatus, to: AppointmentStatus) -> Result<bool> {
        let path = format!("{}&status=eq.{}", Self::by_id(id), from);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(json!({ "status": to })),
                Some(prefer("return=representation")?),
            )
            .await
            .context("Failed to update appointment status")?;
        Ok(!updated.is_empty())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &Self::by_id(id),
                None,
                None,
                Some(prefer("return=representation")?),
            )
            .await
            .context("Failed to delete appointment")?;
        Ok(!deleted.is_empty())
    }
}
