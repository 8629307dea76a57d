use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Appointment, AppointmentStatus};

/// Result of an all-or-nothing batch insert. A taken key is data, not an
/// error: nothing from the batch was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    Conflict { key: String },
}

/// The authoritative appointment records, keyed by `Appointment::id`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get_appointments(&self, date: NaiveDate, professional_id: &str) -> Result<Vec<Appointment>>;

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>>;

    /// Writes every appointment or none. The key check and the write happen
    /// in one atomic step; on conflict `key` is the first taken key in batch
    /// order.
    async fn create_all(&self, appointments: &[Appointment]) -> Result<CommitOutcome>;

    /// Sets `to` only while the stored status is still `from`, as one atomic
    /// step. Returns false when the appointment is missing or has moved on.
    async fn update_status(&self, id: &str, from: AppointmentStatus, to: AppointmentStatus) -> Result<bool>;

    /// Returns whether the appointment existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}
