// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{BlockKind, BlockedDay, BlockedDayForEmployee, BlockedTime, ScheduleDay, ScheduleEntry};
use crate::services::{BlockingService, ScheduleService};
use crate::time::hhmm_option;

pub struct ScheduleCellState {
    pub schedule: Arc<ScheduleService>,
    pub blocking: Arc<BlockingService>,
}

/// Body for saving a schedule entry; the professional comes from the path.
#[derive(Debug, Deserialize)]
pub struct ScheduleEntryBody {
    pub weekday: ScheduleDay,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, with = "hhmm_option")]
    pub lunch_start: Option<chrono::NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub lunch_end: Option<chrono::NaiveTime>,
}

impl ScheduleEntryBody {
    fn into_entry(self, professional_id: String) -> Result<ScheduleEntry, AppError> {
        let parse = |raw: &str| {
            crate::time::parse_time_of_day(raw)
                .ok_or_else(|| AppError::ValidationError(format!("Invalid time '{}'", raw)))
        };
        Ok(ScheduleEntry {
            professional_id,
            day: self.weekday,
            start_time: parse(&self.start_time)?,
            end_time: parse(&self.end_time)?,
            lunch_start: self.lunch_start,
            lunch_end: self.lunch_end,
        })
    }
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

pub async fn get_schedule(
    State(state): State<Arc<ScheduleCellState>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entries = state.schedule.get_schedule(&professional_id).await?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "entries": entries,
    })))
}

pub async fn save_schedule_entry(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<String>,
    Json(body): Json<ScheduleEntryBody>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let entry = state
        .schedule
        .save_entry(body.into_entry(professional_id)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry,
    })))
}

pub async fn delete_schedule_entry(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    state.schedule.delete_entry(&key).await?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// BLOCKING HANDLERS
// ==============================================================================

pub async fn get_blocked_days(
    State(state): State<Arc<ScheduleCellState>>,
) -> Result<Json<Value>, AppError> {
    let days = state.blocking.blocked_days().await?;
    Ok(Json(json!({ "blocked_days": days })))
}

pub async fn get_blocks_on(
    State(state): State<Arc<ScheduleCellState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    let blocks = state.blocking.blocks_on(date).await?;
    Ok(Json(json!({
        "date": date,
        "blocks": blocks,
    })))
}

pub async fn block_whole_day(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Json(body): Json<BlockedDay>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let block = state.blocking.block_whole_day(body.date).await?;
    Ok(Json(json!({ "success": true, "key": block.key(), "block": block })))
}

pub async fn block_day_for_professional(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Json(body): Json<BlockedDayForEmployee>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let block = state
        .blocking
        .block_day_for_professional(body.date, &body.professional_id)
        .await?;
    Ok(Json(json!({ "success": true, "key": block.key(), "block": block })))
}

pub async fn block_single_time(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Json(body): Json<BlockedTime>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let block = state
        .blocking
        .block_single_time(body.date, body.time, &body.professional_id)
        .await?;
    Ok(Json(json!({ "success": true, "key": block.key(), "block": block })))
}

pub async fn unblock(
    State(state): State<Arc<ScheduleCellState>>,
    Extension(user): Extension<User>,
    Path((kind, key)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let kind: BlockKind = kind.parse()?;
    let removed = state.blocking.unblock(kind, &key).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}
