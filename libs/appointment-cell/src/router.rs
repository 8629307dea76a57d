// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AppointmentCellState};

pub fn appointment_routes(config: Arc<AppConfig>, state: Arc<AppointmentCellState>) -> Router {
    Router::new()
        .route("/availability", get(handlers::get_available_times))
        .route("/availability/summary", get(handlers::get_availability_summary))
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::create_appointments),
        )
        .route("/{appointment_id}", delete(handlers::cancel_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
