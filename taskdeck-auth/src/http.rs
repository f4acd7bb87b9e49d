//! HTTP helpers shared by the identity calls and the resource client

use serde::Deserialize;
use taskdeck_core::{ApiConfig, ErrorContext, TaskdeckError, TaskdeckResult};

/// Build the underlying HTTP client with the configured timeout and user agent
pub fn create_http_client(config: &ApiConfig) -> TaskdeckResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            TaskdeckError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| TaskdeckError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Join the base URL and an absolute endpoint path
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a transport failure (connect, timeout, body read) to a network error
pub fn network_error(error: reqwest::Error, component: &str, operation: &str) -> TaskdeckError {
    let suggestion = if error.is_timeout() {
        "The server did not answer in time; try again"
    } else {
        "Check network connectivity and the configured api.base_url"
    };

    TaskdeckError::Network {
        message: format!("Request failed: {}", error),
        source: Some(Box::new(error)),
        context: ErrorContext::new(component)
            .with_operation(operation)
            .with_suggestion(suggestion),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServerMessage {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<ServerMessage>,
}

/// Extract the human-readable `message` from an error body, if any.
///
/// Accepts `{"message": "..."}` and `{"message": ["...", ...]}`; the first
/// entry of an array is used.
pub fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.message? {
        ServerMessage::One(message) => message,
        ServerMessage::Many(messages) => messages.into_iter().next()?,
    };

    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
