// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schedule_cell::time::{format_time_of_day, hhmm};
use schedule_cell::{compose_key, date_key, ScheduleError};
use shared_models::auth::User;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A committed booking. `id` is the identity key `date_professionalId_time`,
/// which is what makes a slot impossible to book twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub professional_id: String,
    pub patient_name: String,
    pub requester_user_id: String,
    #[serde(default)]
    pub requester_email: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        professional_id: &str,
        patient_name: &str,
        requester: &Requester,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: appointment_key(date, professional_id, time),
            date,
            time,
            professional_id: professional_id.to_string(),
            patient_name: patient_name.to_string(),
            requester_user_id: requester.user_id.clone(),
            requester_email: requester.email.clone(),
            status: AppointmentStatus::Confirmed,
            notes,
            created_at: Some(Utc::now()),
        }
    }
}

pub fn appointment_key(date: NaiveDate, professional_id: &str, time: NaiveTime) -> String {
    compose_key(&[&date_key(date), professional_id, &format_time_of_day(time)])
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(AppointmentError::ValidationError(format!(
                "Unknown appointment status '{}'",
                other
            ))),
        }
    }
}

/// Who is asking. Threaded explicitly into booking and cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin(),
        }
    }
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// One booking batch: `times[i]` is reserved for `patient_names[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub professional_id: String,
    /// Display name used in notifications; defaults to the id.
    #[serde(default)]
    pub professional_name: Option<String>,
    pub times: Vec<String>,
    pub patient_names: Vec<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub professional_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilitySummaryQuery {
    pub date: NaiveDate,
    /// Comma separated.
    pub professional_ids: String,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub date: NaiveDate,
    pub professional_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfessionalAvailability {
    pub professional_id: String,
    pub times: Vec<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Time {time} is already booked")]
    SlotConflict { time: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppointmentError {
    pub fn store(err: anyhow::Error) -> Self {
        AppointmentError::StoreUnavailable(format!("{:#}", err))
    }
}

impl From<ScheduleError> for AppointmentError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            ScheduleError::StoreUnavailable(msg) => AppointmentError::StoreUnavailable(msg),
            ScheduleError::NotFound(msg) => AppointmentError::NotFound(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::SlotConflict { time } => AppError::Conflict {
                message: format!("Time {} is already booked", time),
                time: Some(time),
            },
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            AppointmentError::NotFound(msg) => AppError::NotFound(msg),
            e @ AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            AppointmentError::Unauthorized(msg) => AppError::Forbidden(msg),
        }
    }
}
