// libs/appointment-cell/src/services/booking.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use schedule_cell::time::{format_time_of_day, parse_time_of_day};
use schedule_cell::validate_professional_id;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookingRequest, Requester};
use crate::services::lifecycle::validate_status_transition;
use crate::services::notification::{NotificationDispatcher, NotificationPayload};
use crate::services::store::{AppointmentStore, CommitOutcome};

pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl BookingService {
    pub fn new(store: Arc<dyn AppointmentStore>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    /// Books every `(time, patient)` pair of the request or none of them.
    ///
    /// The request is validated before any store access. A taken slot comes
    /// back as `SlotConflict` naming the first taken time in request order.
    /// Once committed, the booking stands and returns without waiting on the
    /// notification.
    pub async fn create_appointments(
        &self,
        request: BookingRequest,
        requester: &Requester,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let times = validate_booking(&request)?;

        let batch: Vec<Appointment> = times
            .iter()
            .zip(&request.patient_names)
            .map(|(time, patient_name)| {
                Appointment::new(
                    request.date,
                    *time,
                    &request.professional_id,
                    patient_name.trim(),
                    requester,
                    request.details.clone(),
                )
            })
            .collect();

        debug!(
            "Committing {} appointments for {} on {}",
            batch.len(),
            request.professional_id,
            request.date
        );

        match self.store.create_all(&batch).await.map_err(AppointmentError::store)? {
            CommitOutcome::Committed => {}
            CommitOutcome::Conflict { key } => {
                let time = batch
                    .iter()
                    .find(|a| a.id == key)
                    .map(|a| format_time_of_day(a.time))
                    .unwrap_or(key);
                warn!(
                    "Slot conflict for {} on {} at {}",
                    request.professional_id, request.date, time
                );
                return Err(AppointmentError::SlotConflict { time });
            }
        }

        info!(
            "Booked {} appointments for {} on {}",
            batch.len(),
            request.professional_id,
            request.date
        );

        let professional = request
            .professional_name
            .clone()
            .unwrap_or_else(|| request.professional_id.clone());
        self.notify(NotificationPayload {
            email: requester.email.clone(),
            user_id: requester.user_id.clone(),
            date: request.date,
            times: batch.iter().map(|a| format_time_of_day(a.time)).collect(),
            professional,
            patient_names: batch.iter().map(|a| a.patient_name.clone()).collect(),
            details: request.details.clone(),
            is_edit: false,
            is_delete: false,
        });

        Ok(batch)
    }

    /// Deletes the appointment, freeing its slot. Non-admins may only cancel
    /// their own bookings. The notification goes to whoever made the booking.
    pub async fn cancel_appointment(
        &self,
        id: &str,
        requester: &Requester,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find(id).await?;

        if !requester.is_admin && appointment.requester_user_id != requester.user_id {
            return Err(AppointmentError::Unauthorized(
                "Only the requester or an administrator can cancel this appointment".to_string(),
            ));
        }

        let removed = self.store.delete(id).await.map_err(AppointmentError::store)?;
        if !removed {
            return Err(AppointmentError::NotFound(format!("Appointment {} not found", id)));
        }
        info!("Cancelled appointment {}", id);

        self.notify(NotificationPayload {
            email: appointment.requester_email.clone(),
            user_id: appointment.requester_user_id.clone(),
            date: appointment.date,
            times: vec![format_time_of_day(appointment.time)],
            professional: appointment.professional_id.clone(),
            patient_names: vec![appointment.patient_name.clone()],
            details: appointment.notes.clone(),
            is_edit: false,
            is_delete: true,
        });

        Ok(appointment)
    }

    /// Moves the appointment to `status`. The store only applies the change if
    /// the status is still the one the transition was checked against.
    pub async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.find(id).await?;
        validate_status_transition(appointment.status, status)?;

        let updated = self
            .store
            .update_status(id, appointment.status, status)
            .await
            .map_err(AppointmentError::store)?;
        if !updated {
            let current = self.find(id).await?;
            warn!(
                "Appointment {} changed to {} before it could move to {}",
                id, current.status, status
            );
            return Err(AppointmentError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }

        info!("Appointment {} moved from {} to {}", id, appointment.status, status);
        appointment.status = status;
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        date: NaiveDate,
        professional_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        validate_professional_id(professional_id)?;
        let mut appointments = self
            .store
            .get_appointments(date, professional_id)
            .await
            .map_err(AppointmentError::store)?;
        appointments.sort_by_key(|a| a.time);
        Ok(appointments)
    }

    async fn find(&self, id: &str) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(id)
            .await
            .map_err(AppointmentError::store)?
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment {} not found", id)))
    }

    /// Dispatches in the background; a failure is only logged.
    fn notify(&self, payload: NotificationPayload) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch(&payload).await {
                warn!("Notification for {} on {} failed: {:#}", payload.user_id, payload.date, e);
            }
        });
    }
}

/// Checks the request shape and returns its times, parsed and in order.
fn validate_booking(request: &BookingRequest) -> Result<Vec<NaiveTime>, AppointmentError> {
    validate_professional_id(&request.professional_id)?;

    if request.patient_names.is_empty() {
        return Err(AppointmentError::ValidationError(
            "At least one patient name is required".to_string(),
        ));
    }
    if request.times.len() != request.patient_names.len() {
        return Err(AppointmentError::ValidationError(format!(
            "Got {} times for {} patients",
            request.times.len(),
            request.patient_names.len()
        )));
    }
    if request.patient_names.iter().any(|name| name.trim().is_empty()) {
        return Err(AppointmentError::ValidationError(
            "Patient names must not be blank".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    request
        .times
        .iter()
        .map(|raw| {
            let time = parse_time_of_day(raw)
                .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid time '{}'", raw)))?;
            if !seen.insert(time) {
                return Err(AppointmentError::ValidationError(format!(
                    "Time {} appears more than once",
                    format_time_of_day(time)
                )));
            }
            Ok(time)
        })
        .collect()
}
