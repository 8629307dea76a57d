pub mod blocking;
pub mod cache;
pub mod memory;
pub mod schedule;
pub mod slots;
pub mod store;
pub mod supabase;

pub use blocking::BlockingService;
pub use cache::CachedScheduleStore;
pub use memory::{InMemoryBlockingStore, InMemoryScheduleStore};
pub use schedule::ScheduleService;
pub use slots::SlotGenerator;
pub use store::{BlockingStore, ScheduleStore};
pub use supabase::{SupabaseBlockingStore, SupabaseScheduleStore};
