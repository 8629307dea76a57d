use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use appointment_cell::{
    AppointmentError, AppointmentStatus, AppointmentStore, BookingRequest, BookingService,
    InMemoryAppointmentStore, NotificationDispatcher, NotificationPayload, Requester,
};

struct RecordingNotifier {
    sent: UnboundedSender<NotificationPayload>,
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn dispatch(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        self.sent.send(payload.clone())?;
        Ok(())
    }
}

/// A webhook that never answers.
struct StalledNotifier;

#[async_trait]
impl NotificationDispatcher for StalledNotifier {
    async fn dispatch(&self, _payload: &NotificationPayload) -> anyhow::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn dispatch(&self, _payload: &NotificationPayload) -> anyhow::Result<()> {
        Err(anyhow!("webhook down"))
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn requester(user_id: &str, is_admin: bool) -> Requester {
    Requester {
        user_id: user_id.to_string(),
        email: Some(format!("{}@clinic.test", user_id)),
        is_admin,
    }
}

fn request_for(times: &[&str], patients: &[&str]) -> BookingRequest {
    BookingRequest {
        date: day(),
        professional_id: "dr-ana".to_string(),
        professional_name: Some("Dr. Ana".to_string()),
        times: times.iter().map(|t| t.to_string()).collect(),
        patient_names: patients.iter().map(|p| p.to_string()).collect(),
        details: Some("first visit".to_string()),
    }
}

async fn next_notification(sent: &mut UnboundedReceiver<NotificationPayload>) -> NotificationPayload {
    tokio::time::timeout(Duration::from_secs(1), sent.recv())
        .await
        .expect("notification was not dispatched")
        .expect("notifier dropped")
}

fn service() -> (
    BookingService,
    Arc<InMemoryAppointmentStore>,
    UnboundedReceiver<NotificationPayload>,
) {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let notifier = Arc::new(RecordingNotifier { sent: tx });
    (BookingService::new(store.clone(), notifier), store, rx)
}

#[tokio::test]
async fn test_booking_commits_confirmed_appointments_and_notifies() {
    let (booking, store, mut sent) = service();

    let created = booking
        .create_appointments(booking_request_pair(), &requester("user-1", false))
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|a| a.status == AppointmentStatus::Confirmed));
    assert_eq!(created[0].id, "2025-03-10_dr-ana_09:00");
    assert_eq!(store.len().await, 2);

    let notification = next_notification(&mut sent).await;
    assert_eq!(notification.times, vec!["09:00", "09:30"]);
    assert_eq!(notification.patient_names, vec!["Maria", "João"]);
    assert_eq!(notification.professional, "Dr. Ana");
    assert_eq!(notification.user_id, "user-1");
    assert!(!notification.is_delete);
}

fn booking_request_pair() -> BookingRequest {
    request_for(&["9:00", "09:30"], &["Maria", "João"])
}

#[tokio::test]
async fn test_batch_with_one_taken_time_writes_nothing() {
    let (booking, store, _) = service();
    booking
        .create_appointments(request_for(&["09:30"], &["Pedro"]), &requester("user-2", false))
        .await
        .unwrap();

    let result = booking
        .create_appointments(booking_request_pair(), &requester("user-1", false))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { ref time }) if time == "09:30");
    let remaining = booking.list_appointments(day(), "dr-ana").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].patient_name, "Pedro");
    assert!(store.get_appointment("2025-03-10_dr-ana_09:00").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_for_same_slot_have_one_winner() {
    let (booking, store, _) = service();
    let booking = Arc::new(booking);

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let booking = booking.clone();
            tokio::spawn(async move {
                let patient = format!("Patient {}", i);
                booking
                    .create_appointments(
                        request_for(&["10:00"], &[patient.as_str()]),
                        &requester(&format!("user-{}", i), false),
                    )
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    let mut conflicts = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AppointmentError::SlotConflict { time }) => {
                assert_eq!(time, "10:00");
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_notification_failure_keeps_booking() {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let booking = BookingService::new(store.clone(), Arc::new(FailingNotifier));

    let created = booking
        .create_appointments(request_for(&["11:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_stalled_notifier_does_not_hold_up_booking_or_cancel() {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let booking = BookingService::new(store.clone(), Arc::new(StalledNotifier));
    let owner = requester("user-1", false);

    let created = tokio::time::timeout(
        Duration::from_millis(500),
        booking.create_appointments(request_for(&["11:00"], &["Maria"]), &owner),
    )
    .await
    .expect("booking waited on the notifier")
    .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(store.len().await, 1);

    tokio::time::timeout(
        Duration::from_millis(500),
        booking.cancel_appointment("2025-03-10_dr-ana_11:00", &owner),
    )
    .await
    .expect("cancellation waited on the notifier")
    .unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_store() {
    let (booking, store, mut sent) = service();

    let result = booking
        .create_appointments(request_for(&["09:00", "09:30"], &["Maria"]), &requester("user-1", false))
        .await;

    assert_matches!(result, Err(AppointmentError::ValidationError(_)));
    assert!(store.is_empty().await);
    tokio::task::yield_now().await;
    assert!(sent.try_recv().is_err());
}

#[tokio::test]
async fn test_cancel_frees_slot_and_sends_delete_notification() {
    let (booking, _, mut sent) = service();
    let owner = requester("user-1", false);
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &owner)
        .await
        .unwrap();
    assert!(!next_notification(&mut sent).await.is_delete);

    let cancelled = booking
        .cancel_appointment("2025-03-10_dr-ana_09:00", &owner)
        .await
        .unwrap();
    assert_eq!(cancelled.patient_name, "Maria");

    let notification = next_notification(&mut sent).await;
    assert!(notification.is_delete);
    assert_eq!(notification.times, vec!["09:00"]);

    booking
        .create_appointments(request_for(&["09:00"], &["Pedro"]), &owner)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_admin_cancel_notifies_original_requester() {
    let (booking, _, mut sent) = service();
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();
    next_notification(&mut sent).await;

    booking
        .cancel_appointment("2025-03-10_dr-ana_09:00", &requester("admin-1", true))
        .await
        .unwrap();

    let notification = next_notification(&mut sent).await;
    assert!(notification.is_delete);
    assert_eq!(notification.user_id, "user-1");
    assert_eq!(notification.email.as_deref(), Some("user-1@clinic.test"));
}

#[tokio::test]
async fn test_only_owner_or_admin_can_cancel() {
    let (booking, _, _) = service();
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();

    let result = booking
        .cancel_appointment("2025-03-10_dr-ana_09:00", &requester("user-2", false))
        .await;
    assert_matches!(result, Err(AppointmentError::Unauthorized(_)));

    booking
        .cancel_appointment("2025-03-10_dr-ana_09:00", &requester("admin-1", true))
        .await
        .unwrap();

    let result = booking
        .cancel_appointment("2025-03-10_dr-ana_09:00", &requester("admin-1", true))
        .await;
    assert_matches!(result, Err(AppointmentError::NotFound(_)));
}

#[tokio::test]
async fn test_status_follows_lifecycle() {
    let (booking, _, _) = service();
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();
    let id = "2025-03-10_dr-ana_09:00";

    let completed = booking.update_status(id, AppointmentStatus::Completed).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let result = booking.update_status(id, AppointmentStatus::Confirmed).await;
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Confirmed
        })
    );

    let cancelled = booking.update_status(id, AppointmentStatus::Cancelled).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let result = booking.update_status(id, AppointmentStatus::Completed).await;
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Cancelled,
            ..
        })
    );
}

#[tokio::test]
async fn test_status_write_requires_unchanged_status() {
    let (booking, store, _) = service();
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();
    let id = "2025-03-10_dr-ana_09:00";

    assert!(store
        .update_status(id, AppointmentStatus::Confirmed, AppointmentStatus::Completed)
        .await
        .unwrap());
    // Still expects confirmed, which another writer already moved on from.
    assert!(!store
        .update_status(id, AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
        .await
        .unwrap());
    assert_eq!(
        store.get_appointment(id).await.unwrap().unwrap().status,
        AppointmentStatus::Completed
    );
}

#[tokio::test]
async fn test_cancelled_status_still_holds_slot() {
    let (booking, _, _) = service();
    booking
        .create_appointments(request_for(&["09:00"], &["Maria"]), &requester("user-1", false))
        .await
        .unwrap();
    booking
        .update_status("2025-03-10_dr-ana_09:00", AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let result = booking
        .create_appointments(request_for(&["09:00"], &["Pedro"]), &requester("user-2", false))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotConflict { .. }));
}
