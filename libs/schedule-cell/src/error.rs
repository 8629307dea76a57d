use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ScheduleError {
    pub fn store(err: anyhow::Error) -> Self {
        ScheduleError::StoreUnavailable(format!("{:#}", err))
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ValidationError(msg) => AppError::ValidationError(msg),
            ScheduleError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            ScheduleError::NotFound(msg) => AppError::NotFound(msg),
        }
    }
}
