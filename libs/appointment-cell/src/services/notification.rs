use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

/// Body of the outbound booking notification. `is_edit` and `is_delete` pick
/// the template on the receiving side; both false means a new booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub email: Option<String>,
    pub user_id: String,
    pub date: NaiveDate,
    pub times: Vec<String>,
    pub professional: String,
    pub patient_names: Vec<String>,
    pub details: Option<String>,
    pub is_edit: bool,
    pub is_delete: bool,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()>;
}

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts the payload as JSON to a configured webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build notification client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookNotifier {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()> {
        debug!("Posting notification for {} to {}", payload.date, self.url);

        self.client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .context("Notification webhook unreachable")?
            .error_for_status()
            .context("Notification webhook rejected the payload")?;
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()> {
        info!(
            "Notification (not sent): {} {} {:?} for {:?} with {} (delete: {})",
            payload.user_id,
            payload.date,
            payload.times,
            payload.patient_names,
            payload.professional,
            payload.is_delete
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> NotificationPayload {
        NotificationPayload {
            email: Some("front@clinic.test".to_string()),
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            times: vec!["09:00".to_string()],
            professional: "Dr. Ana".to_string(),
            patient_names: vec!["Maria".to_string()],
            details: None,
            is_edit: false,
            is_delete: true,
        }
    }

    #[tokio::test]
    async fn test_webhook_posts_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_json(json!({
                "email": "front@clinic.test",
                "userId": "user-1",
                "date": "2025-03-10",
                "times": ["09:00"],
                "professional": "Dr. Ana",
                "patientNames": ["Maria"],
                "details": null,
                "isEdit": false,
                "isDelete": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/notify", server.uri())).unwrap();
        notifier.dispatch(&payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri()).unwrap();
        assert!(notifier.dispatch(&payload()).await.is_err());
    }

    #[tokio::test]
    async fn test_slow_webhook_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
        assert!(notifier.dispatch(&payload()).await.is_err());
    }
}
