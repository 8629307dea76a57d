use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, ScheduleCellState};

pub fn schedule_routes(config: Arc<AppConfig>, state: Arc<ScheduleCellState>) -> Router {
    Router::new()
        // Working hours
        .route(
            "/professionals/{professional_id}/entries",
            get(handlers::get_schedule).put(handlers::save_schedule_entry),
        )
        .route("/entries/{key}", delete(handlers::delete_schedule_entry))
        // Blocks
        .route("/blocks/days", get(handlers::get_blocked_days).post(handlers::block_whole_day))
        .route("/blocks/professional-days", post(handlers::block_day_for_professional))
        .route("/blocks/times", post(handlers::block_single_time))
        .route("/blocks/{date}", get(handlers::get_blocks_on))
        .route("/blocks/{kind}/{key}", delete(handlers::unblock))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
