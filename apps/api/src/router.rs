use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tracing::{info, warn};

use appointment_cell::handlers::AppointmentCellState;
use appointment_cell::router::appointment_routes;
use appointment_cell::{
    AppointmentStore, AvailabilityResolver, BookingService, InMemoryAppointmentStore, LogNotifier,
    NotificationDispatcher, SupabaseAppointmentStore, WebhookNotifier,
};
use schedule_cell::handlers::ScheduleCellState;
use schedule_cell::router::schedule_routes;
use schedule_cell::{
    BlockingService, BlockingStore, CachedScheduleStore, InMemoryBlockingStore, InMemoryScheduleStore,
    ScheduleService, ScheduleStore, SlotGenerator, SupabaseBlockingStore, SupabaseScheduleStore,
    TimeCatalog,
};
use shared_config::AppConfig;

struct Stores {
    schedule: Arc<dyn ScheduleStore>,
    blocking: Arc<dyn BlockingStore>,
    appointments: Arc<dyn AppointmentStore>,
}

fn build_stores(config: &AppConfig) -> Stores {
    let stores = if config.is_configured() {
        info!("Using Supabase stores at {}", config.supabase_url);
        Stores {
            schedule: Arc::new(SupabaseScheduleStore::new(config)),
            blocking: Arc::new(SupabaseBlockingStore::new(config)),
            appointments: Arc::new(SupabaseAppointmentStore::new(config)),
        }
    } else {
        warn!("Supabase is not configured; data lives in memory and is lost on restart");
        Stores {
            schedule: Arc::new(InMemoryScheduleStore::new()),
            blocking: Arc::new(InMemoryBlockingStore::new()),
            appointments: Arc::new(InMemoryAppointmentStore::new()),
        }
    };

    if config.schedule_cache_ttl_seconds == 0 {
        return stores;
    }
    Stores {
        schedule: Arc::new(CachedScheduleStore::new(
            stores.schedule,
            Duration::from_secs(config.schedule_cache_ttl_seconds),
        )),
        ..stores
    }
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn NotificationDispatcher>> {
    Ok(match &config.notification_webhook_url {
        Some(url) if config.is_notification_configured() => Arc::new(WebhookNotifier::new(url.clone())?),
        _ => {
            warn!("No notification webhook configured; notifications are only logged");
            Arc::new(LogNotifier)
        }
    })
}

pub fn create_router(config: Arc<AppConfig>) -> anyhow::Result<Router> {
    let stores = build_stores(&config);
    let slots = SlotGenerator::new(config.slot_step_minutes)?;
    let catalog = TimeCatalog::from_config(&config)?;

    let schedule = Arc::new(ScheduleService::new(stores.schedule));
    let blocking = Arc::new(BlockingService::new(stores.blocking));

    let availability = Arc::new(AvailabilityResolver::new(
        schedule.clone(),
        blocking.clone(),
        stores.appointments.clone(),
        slots,
        catalog,
    ));
    let booking = Arc::new(BookingService::new(stores.appointments, build_notifier(&config)?));

    let schedule_state = Arc::new(ScheduleCellState { schedule, blocking });
    let appointment_state = Arc::new(AppointmentCellState { availability, booking });

    Ok(Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/schedule", schedule_routes(config.clone(), schedule_state))
        .nest("/appointments", appointment_routes(config, appointment_state)))
}
