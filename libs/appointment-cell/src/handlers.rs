use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use schedule_cell::time::format_time_of_day;
use shared_config::split_list;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{
    AppointmentListQuery, AvailabilityQuery, AvailabilitySummaryQuery, BookingRequest, Requester,
    UpdateStatusRequest,
};
use crate::services::{AvailabilityResolver, BookingService};

pub struct AppointmentCellState {
    pub availability: Arc<AvailabilityResolver>,
    pub booking: Arc<BookingService>,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_times(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let now = Local::now().naive_local();
    let times = state
        .availability
        .available_times(query.date, &query.professional_id, user.is_admin(), now)
        .await?;

    let times: Vec<String> = times.into_iter().map(format_time_of_day).collect();
    Ok(Json(json!({
        "professional_id": query.professional_id,
        "date": query.date,
        "times": times,
    })))
}

pub async fn get_availability_summary(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Query(query): Query<AvailabilitySummaryQuery>,
) -> Result<Json<Value>, AppError> {
    let professional_ids = split_list(&query.professional_ids);
    if professional_ids.is_empty() {
        return Err(AppError::BadRequest("professional_ids must not be empty".to_string()));
    }

    let now = Local::now().naive_local();
    let summary = state
        .availability
        .summary(query.date, &professional_ids, user.is_admin(), now)
        .await?;

    Ok(Json(json!({
        "date": query.date,
        "professionals": summary,
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, AppError> {
    let requester = Requester::from(&user);
    let appointments = state.booking.create_appointments(request, &requester).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments,
    })))
}

pub async fn list_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .booking
        .list_appointments(query.date, &query.professional_id)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let requester = Requester::from(&user);
    let appointment = state
        .booking
        .cancel_appointment(&appointment_id, &requester)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let appointment = state
        .booking
        .update_status(&appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}
