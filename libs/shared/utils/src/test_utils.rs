use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "receptionist")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "receptionist")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        // HMAC accepts keys of any length, so the error arm is unreachable.
        let signature_encoded = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
            Ok(mut mac) => {
                mac.update(signing_input.as_bytes());
                general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
            }
            Err(_) => String::new(),
        };

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, Some(1)))
    }
}

/// PostgREST-shaped rows for the scheduling tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn schedule_entry_response(
        professional_id: &str,
        weekday: &str,
        start: &str,
        end: &str,
    ) -> serde_json::Value {
        json!({
            "id": format!("{}_{}", professional_id, weekday),
            "professional_id": professional_id,
            "weekday": weekday,
            "start_time": start,
            "end_time": end,
            "lunch_start": null,
            "lunch_end": null
        })
    }

    pub fn appointment_response(
        date: &str,
        professional_id: &str,
        time: &str,
        patient_name: &str,
    ) -> serde_json::Value {
        json!({
            "id": format!("{}_{}_{}", date, professional_id, time),
            "date": date,
            "time": time,
            "professional_id": professional_id,
            "patient_name": patient_name,
            "requester_user_id": "user-1",
            "requester_email": "front-desk@clinic.test",
            "status": "confirmed",
            "notes": null,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn blocked_time_response(date: &str, time: &str, professional_id: &str) -> serde_json::Value {
        json!({
            "id": format!("{}_{}_{}", date, time, professional_id),
            "date": date,
            "time": time,
            "professional_id": professional_id
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
