// libs/schedule-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::models::{validate_professional_id, ScheduleEntry};
use crate::services::store::ScheduleStore;

pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn get_schedule(&self, professional_id: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        validate_professional_id(professional_id)?;
        self.store
            .get_schedule(professional_id)
            .await
            .map_err(ScheduleError::store)
    }

    /// The entry governing `date`: a date override wins over the weekly rule.
    /// `None` means the professional does not work that day.
    pub async fn entry_for_date(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let schedule = self.get_schedule(professional_id).await?;

        let mut matching: Vec<ScheduleEntry> = schedule
            .into_iter()
            .filter(|entry| entry.day.applies_to(date))
            .collect();
        matching.sort_by_key(|entry| !entry.day.is_override());

        let entry = matching.into_iter().next();
        debug!(
            "Schedule for {} on {}: {}",
            professional_id,
            date,
            entry.as_ref().map_or("none".to_string(), |e| e.key())
        );
        Ok(entry)
    }

    pub async fn save_entry(&self, entry: ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        entry.validate()?;
        self.store
            .save_entry(&entry)
            .await
            .map_err(ScheduleError::store)?;
        info!("Saved schedule entry {}", entry.key());
        Ok(entry)
    }

    pub async fn delete_entry(&self, key: &str) -> Result<(), ScheduleError> {
        let removed = self
            .store
            .delete_entry(key)
            .await
            .map_err(ScheduleError::store)?;
        if !removed {
            return Err(ScheduleError::NotFound(format!("Schedule entry {} not found", key)));
        }
        info!("Deleted schedule entry {}", key);
        Ok(())
    }
}
