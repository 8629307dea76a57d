pub mod availability;
pub mod booking;
pub mod lifecycle;
pub mod memory;
pub mod notification;
pub mod store;
pub mod supabase;

pub use availability::AvailabilityResolver;
pub use booking::BookingService;
pub use memory::InMemoryAppointmentStore;
pub use notification::{LogNotifier, NotificationDispatcher, NotificationPayload, WebhookNotifier};
pub use store::{AppointmentStore, CommitOutcome};
pub use supabase::SupabaseAppointmentStore;
