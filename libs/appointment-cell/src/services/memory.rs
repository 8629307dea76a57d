use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::models::{Appointment, AppointmentStatus};
use crate::services::store::{AppointmentStore, CommitOutcome};

/// Process-local appointment store. `create_all` checks and inserts the whole
/// batch under a single lock.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: Mutex<BTreeMap<String, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.appointments.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.appointments.lock().await.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get_appointments(&self, date: NaiveDate, professional_id: &str) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .values()
            .filter(|a| a.date == date && a.professional_id == professional_id)
            .cloned()
            .collect())
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>> {
        Ok(self.appointments.lock().await.get(id).cloned())
    }

    async fn create_all(&self, batch: &[Appointment]) -> Result<CommitOutcome> {
        let mut appointments = self.appointments.lock().await;

        if let Some(taken) = batch.iter().find(|a| appointments.contains_key(&a.id)) {
            return Ok(CommitOutcome::Conflict {
                key: taken.id.clone(),
            });
        }

        for appointment in batch {
            appointments.insert(appointment.id.clone(), appointment.clone());
        }
        Ok(CommitOutcome::Committed)
    }

    async fn update_status(&self, id: &str, from: AppointmentStatus, to: AppointmentStatus) -> Result<bool> {
        let mut appointments = self.appointments.lock().await;
        Ok(match appointments.get_mut(id) {
            Some(appointment) if appointment.status == from => {
                appointment.status = to;
                true
            }
            _ => false,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.appointments.lock().await.remove(id).is_some())
    }
}
