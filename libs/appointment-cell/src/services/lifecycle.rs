// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Statuses reachable from `current`. Anything can be cancelled; cancelled is
/// terminal.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending | AppointmentStatus::Scheduled => {
            &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Confirmed => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
        AppointmentStatus::Completed => &[AppointmentStatus::Cancelled],
        AppointmentStatus::Cancelled => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    new_status: AppointmentStatus,
) -> Result<(), AppointmentError> {
    debug!("Validating status transition from {} to {}", current, new_status);

    if !valid_transitions(current).contains(&new_status) {
        warn!("Invalid status transition attempted: {} -> {}", current, new_status);
        return Err(AppointmentError::InvalidStatusTransition {
            from: current,
            to: new_status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_confirmed_can_complete_or_cancel() {
        assert!(validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Completed).is_ok());
        assert!(validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled).is_ok());
        assert!(validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Confirmed).is_ok());
        assert!(validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_completed_can_only_be_cancelled() {
        assert!(validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Cancelled).is_ok());
        assert_matches!(
            validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(valid_transitions(AppointmentStatus::Cancelled).is_empty());
        assert_matches!(
            validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn test_cannot_skip_confirmation() {
        assert_matches!(
            validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Completed),
            Err(AppointmentError::InvalidStatusTransition {
                from: AppointmentStatus::Pending,
                to: AppointmentStatus::Completed
            })
        );
    }
}
