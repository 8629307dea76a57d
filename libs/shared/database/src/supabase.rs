use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unique or primary key violation reported by PostgREST.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    /// Without a user token the anon key doubles as the bearer token.
    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = auth_token.unwrap_or(&self.anon_key);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(method, path, auth_token, body, extra_headers)
            .await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like `request_with_headers` but ignores the response body, for
    /// writes issued with `Prefer: return=minimal`.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<(), DatabaseError> {
        self.send(method, path, auth_token, body, extra_headers)
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DatabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await?;
        error!("API error ({}): {}", status, error_text);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DatabaseError::Auth(error_text),
            StatusCode::NOT_FOUND => DatabaseError::NotFound(error_text),
            StatusCode::CONFLICT => DatabaseError::Conflict(error_text),
            _ => DatabaseError::Api {
                status: status.as_u16(),
                message: error_text,
            },
        })
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn header_value(value: &str) -> Result<HeaderValue, DatabaseError> {
    HeaderValue::from_str(value).map_err(|e| DatabaseError::InvalidHeader(e.to_string()))
}

/// Builds the `Prefer` header PostgREST reads for write behaviour.
pub fn prefer(directives: &str) -> Result<HeaderMap, DatabaseError> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("prefer"), header_value(directives)?);
    Ok(headers)
}

/// Renders an `in.(...)` filter with every value double-quoted, so keys
/// containing `:` or `,` survive PostgREST parsing.
pub fn in_filter<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = values
        .into_iter()
        .map(|value| format!("\"{}\"", value.as_ref().replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseClient {
        let config = AppConfig {
            supabase_url: server.uri(),
            supabase_anon_key: "test-anon-key".to_string(),
            ..AppConfig::default()
        };
        SupabaseClient::new(&config)
    }

    #[test]
    fn test_in_filter_quotes_values() {
        assert_eq!(
            in_filter(["2025-03-10_prof-1_09:00", "2025-03-10_prof-1_09:30"]),
            "in.(\"2025-03-10_prof-1_09:00\",\"2025-03-10_prof-1_09:30\")"
        );
    }

    #[tokio::test]
    async fn test_request_sends_anon_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/schedules"))
            .and(header("apikey", "test-anon-key"))
            .and(header("authorization", "Bearer test-anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "a" }])))
            .mount(&server)
            .await;

        let rows: Vec<Value> = client_for(&server)
            .request(Method::GET, "/rest/v1/schedules", None, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .execute(Method::POST, "/rest/v1/appointments", None, Some(json!([])), None)
            .await;
        assert_matches!(result, Err(DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let result: Result<Vec<Value>, _> = client_for(&server)
            .request(Method::GET, "/rest/v1/blocked_days", None, None)
            .await;
        assert_matches!(result, Err(DatabaseError::Api { status: 503, .. }));
    }
}
