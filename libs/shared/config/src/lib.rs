use std::env;
use tracing::warn;

pub const DEFAULT_SLOT_STEP_MINUTES: u32 = 30;
pub const DEFAULT_SCHEDULE_CACHE_TTL_SECONDS: u64 = 60;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub notification_webhook_url: Option<String>,
    pub slot_step_minutes: u32,
    /// `None` means the generated range is offered as-is to regular callers.
    pub standard_time_catalog: Option<Vec<String>>,
    pub admin_time_catalog: Vec<String>,
    pub schedule_cache_ttl_seconds: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            notification_webhook_url: None,
            slot_step_minutes: DEFAULT_SLOT_STEP_MINUTES,
            standard_time_catalog: None,
            admin_time_catalog: Vec::new(),
            schedule_cache_ttl_seconds: DEFAULT_SCHEDULE_CACHE_TTL_SECONDS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .or_else(|| {
                    warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
                    None
                }),
            slot_step_minutes: parse_number("SLOT_STEP_MINUTES", DEFAULT_SLOT_STEP_MINUTES),
            standard_time_catalog: env::var("STANDARD_TIME_CATALOG")
                .ok()
                .map(|raw| split_list(&raw)),
            admin_time_catalog: env::var("ADMIN_TIME_CATALOG")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            schedule_cache_ttl_seconds: parse_number(
                "SCHEDULE_CACHE_TTL_SECONDS",
                DEFAULT_SCHEDULE_CACHE_TTL_SECONDS,
            ),
            port: parse_number("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing Supabase environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_notification_configured(&self) -> bool {
        self.notification_webhook_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}

fn parse_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Splits a comma separated env value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
