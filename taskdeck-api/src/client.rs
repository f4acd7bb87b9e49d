//! Authenticated Request Client
//!
//! Every resource call goes through [`AuthenticatedClient::get_json`], which
//! attaches the current bearer token before dispatch and inspects the
//! response afterwards. A 401 tears the session down and sends the
//! application to the login path before the caller sees the error.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use taskdeck_auth::http::{create_http_client, endpoint_url, network_error, server_message};
use taskdeck_auth::{Navigator, SessionService};
use taskdeck_core::{ErrorContext, TaskdeckConfig, TaskdeckError, TaskdeckResult};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Query parameters for a GET request
pub type QueryParams = Vec<(&'static str, String)>;

pub struct AuthenticatedClient {
    client: reqwest::Client,
    base_url: String,
    login_path: String,
    session: Arc<SessionService>,
    navigator: Arc<dyn Navigator>,
    /// Serializes teardown so concurrent 401s redirect once
    teardown: Mutex<()>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Compose the client once at startup over the shared session and navigator
    pub fn new(
        config: &TaskdeckConfig,
        session: Arc<SessionService>,
        navigator: Arc<dyn Navigator>,
    ) -> TaskdeckResult<Self> {
        let client = create_http_client(&config.api)?;

        info!("Created resource client for {}", config.api.base_url);

        Ok(Self {
            client,
            base_url: config.api.base_url.clone(),
            login_path: config.session.login_path.clone(),
            session,
            navigator,
            teardown: Mutex::new(()),
        })
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        operation: &str,
    ) -> TaskdeckResult<T> {
        let body = self.get(path, query, operation).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        operation: &str,
    ) -> TaskdeckResult<String> {
        let url = endpoint_url(&self.base_url, path);

        // read the token as late as possible so a fresh login is picked up
        let token = self.session.credentials().get().await;
        debug!(
            url = %url,
            has_token = token.is_some(),
            "Sending resource request"
        );

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| network_error(e, "resource_client", operation))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| network_error(e, "resource_client", operation))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.end_session(token.as_deref()).await;
            return Err(TaskdeckError::authorization_expired(
                "resource_client",
                operation,
            ));
        }

        if !status.is_success() {
            return Err(response_error(status, &body, operation));
        }

        Ok(body)
    }

    /// Forced logout plus redirect. Never fails.
    async fn end_session(&self, presented: Option<&str>) {
        let _guard = self.teardown.lock().await;

        let redirect = match presented {
            Some(token) => self.session.expire(token).await,
            None => self.navigator.current_path() != self.login_path,
        };

        if redirect {
            warn!("Authorization rejected, redirecting to {}", self.login_path);
            self.navigator.navigate(&self.login_path);
        } else {
            debug!("Session already ended, skipping redirect");
        }
    }
}

fn response_error(status: reqwest::StatusCode, body: &str, operation: &str) -> TaskdeckError {
    let message = server_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    TaskdeckError::Api {
        status: status.as_u16(),
        message,
        context: ErrorContext::new("resource_client")
            .with_operation(operation)
            .with_suggestion(match status.as_u16() {
                403 => "Your role does not allow access to this resource",
                404 => "The resource was not found or is not accessible",
                429 => "Too many requests; wait a moment and retry",
                s if s >= 500 => "The server failed to answer; retry shortly",
                _ => "Check the request and try again",
            }),
    }
}
