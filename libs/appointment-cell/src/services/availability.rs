// libs/appointment-cell/src/services/availability.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::future::try_join_all;
use tracing::debug;

use schedule_cell::time::format_time_of_day;
use schedule_cell::{validate_professional_id, BlockingService, ScheduleService, SlotGenerator, TimeCatalog};

use crate::models::{AppointmentError, ProfessionalAvailability};
use crate::services::store::AppointmentStore;

/// Computes bookable times for a professional on a date. Read-only, so
/// callers may retry or run it concurrently for different professionals.
pub struct AvailabilityResolver {
    schedule: Arc<ScheduleService>,
    blocking: Arc<BlockingService>,
    appointments: Arc<dyn AppointmentStore>,
    slots: SlotGenerator,
    catalog: TimeCatalog,
}

impl AvailabilityResolver {
    pub fn new(
        schedule: Arc<ScheduleService>,
        blocking: Arc<BlockingService>,
        appointments: Arc<dyn AppointmentStore>,
        slots: SlotGenerator,
        catalog: TimeCatalog,
    ) -> Self {
        Self {
            schedule,
            blocking,
            appointments,
            slots,
            catalog,
        }
    }

    /// Ascending bookable times. An empty list is a normal answer: the
    /// clinic is closed, the professional has no hours or is blocked, or
    /// everything is taken.
    pub async fn available_times(
        &self,
        date: NaiveDate,
        professional_id: &str,
        caller_is_admin: bool,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        validate_professional_id(professional_id)?;

        if self.blocking.is_clinic_closed(date).await? {
            debug!("Clinic closed on {}", date);
            return Ok(Vec::new());
        }

        let Some(entry) = self.schedule.entry_for_date(professional_id, date).await? else {
            return Ok(Vec::new());
        };

        let blocks = self.blocking.professional_blocks(date, professional_id).await?;
        if blocks.whole_day {
            debug!("{} is blocked for the whole of {}", professional_id, date);
            return Ok(Vec::new());
        }

        let generated = self.slots.generate_for(&entry);
        let candidates = self.catalog.candidates(&generated, caller_is_admin);

        let booked = self
            .appointments
            .get_appointments(date, professional_id)
            .await
            .map_err(AppointmentError::store)?;

        let mut reserved: BTreeSet<NaiveTime> = booked.into_iter().map(|a| a.time).collect();
        reserved.extend(blocks.times);

        let same_day = date == now.date();
        let available: Vec<NaiveTime> = candidates
            .into_iter()
            .filter(|time| !reserved.contains(time))
            .filter(|time| !same_day || *time > now.time())
            .collect();

        debug!(
            "Availability for {} on {}: {} generated, {} reserved, {} bookable",
            professional_id,
            date,
            generated.len(),
            reserved.len(),
            available.len()
        );
        Ok(available)
    }

    /// Resolves several professionals concurrently; fails if any one fails.
    pub async fn summary(
        &self,
        date: NaiveDate,
        professional_ids: &[String],
        caller_is_admin: bool,
        now: NaiveDateTime,
    ) -> Result<Vec<ProfessionalAvailability>, AppointmentError> {
        let lookups = professional_ids.iter().map(|professional_id| async move {
            let times = self
                .available_times(date, professional_id, caller_is_admin, now)
                .await?;
            Ok::<_, AppointmentError>(ProfessionalAvailability {
                professional_id: professional_id.clone(),
                times: times.into_iter().map(format_time_of_day).collect(),
            })
        });

        try_join_all(lookups).await
    }
}
