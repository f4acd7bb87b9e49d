//! Session Service - credential acquisition and session state
//!
//! Talks to the identity endpoint (`/auth/login`, `/auth/register`,
//! `/auth/profile`), keeps the token in the [`CredentialStore`], and caches
//! the signed-in [`UserProfile`] for the lifetime of the process.

use crate::credentials::CredentialStore;
use crate::http::{create_http_client, endpoint_url, network_error, server_message};
use crate::validation::RegistrationForm;
use serde::Serialize;
use std::sync::Arc;
use taskdeck_core::{
    AuthResponse, ErrorContext, LoginRequest, RegisterRequest, TaskdeckConfig, TaskdeckError,
    TaskdeckResult, UserProfile,
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

const LOGIN_FALLBACK_MESSAGE: &str = "Invalid email or password";
const REGISTER_FALLBACK_MESSAGE: &str = "Registration failed. Please try again.";

/// Outcome of restoring a session at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No stored token
    Anonymous,
    /// Stored token accepted and profile recovered
    Authenticated(UserProfile),
    /// Stored token kept but the profile could not be fetched; browsing is
    /// allowed without role-based affordances
    Provisional,
    /// The server rejected the stored token; it has been cleared
    Expired,
}

/// Orchestrates login, registration, and logout over a shared [`CredentialStore`]
pub struct SessionService {
    client: reqwest::Client,
    base_url: String,
    min_password_length: usize,
    credentials: Arc<CredentialStore>,
    user: RwLock<Option<UserProfile>>,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    /// Create a session service for the configured identity endpoint
    pub fn new(config: &TaskdeckConfig, credentials: Arc<CredentialStore>) -> TaskdeckResult<Self> {
        let client = create_http_client(&config.api)?;

        info!("Created session service for {}", config.api.base_url);

        Ok(Self {
            client,
            base_url: config.api.base_url.clone(),
            min_password_length: config.session.min_password_length,
            credentials,
            user: RwLock::new(None),
        })
    }

    /// The store this service writes to
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign in with email and password
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> TaskdeckResult<UserProfile> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .post_credentials("/auth/login", &request, LOGIN_FALLBACK_MESSAGE, "login")
            .await?;

        self.establish(response).await
    }

    /// Create an account and sign in. Form errors are reported before any request is made.
    #[instrument(skip(self, form), fields(email = %form.email, role = %form.role))]
    pub async fn register(&self, form: &RegistrationForm) -> TaskdeckResult<UserProfile> {
        form.validate_with(self.min_password_length)?;

        let request = RegisterRequest {
            email: form.email.clone(),
            password: form.password.clone(),
            role: form.role,
        };

        let response = self
            .post_credentials(
                "/auth/register",
                &request,
                REGISTER_FALLBACK_MESSAGE,
                "register",
            )
            .await?;

        self.establish(response).await
    }

    /// End the session. Never fails.
    pub async fn logout(&self) {
        let mut user = self.user.write().await;
        self.credentials.clear().await;
        *user = None;
        info!("Logged out");
    }

    /// Tear the session down if `presented` is still the active token.
    ///
    /// Used when the server rejects a token. Returns true for the single
    /// caller that performed the teardown; stale or repeated rejections
    /// return false and leave any newer session alone.
    pub async fn expire(&self, presented: &str) -> bool {
        let mut user = self.user.write().await;
        if !self.credentials.clear_if_current(presented).await {
            debug!("Ignoring rejection of a token that is no longer active");
            return false;
        }
        *user = None;
        info!("Session expired, credentials cleared");
        true
    }

    /// Token presence; the server remains the authority on validity
    pub async fn is_authenticated(&self) -> bool {
        self.credentials.has_token().await
    }

    /// Cached profile, if one has been loaded
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.user.read().await.clone()
    }

    /// Fetch the profile for the stored token from `GET /auth/profile`
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> TaskdeckResult<UserProfile> {
        let Some(token) = self.credentials.get().await else {
            return Err(TaskdeckError::Authentication {
                message: "No authentication token".to_string(),
                context: ErrorContext::new("session").with_operation("fetch_profile"),
            });
        };

        let response = self
            .client
            .get(endpoint_url(&self.base_url, "/auth/profile"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| network_error(e, "session", "fetch_profile"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| network_error(e, "session", "fetch_profile"))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TaskdeckError::authorization_expired(
                "session",
                "fetch_profile",
            ));
        }

        if !status.is_success() {
            return Err(TaskdeckError::Api {
                status: status.as_u16(),
                message: server_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string()),
                context: ErrorContext::new("session").with_operation("fetch_profile"),
            });
        }

        let profile: UserProfile = serde_json::from_str(&body)?;

        // only cache if the token is still the one we asked about
        let mut user = self.user.write().await;
        if self.credentials.get().await.as_deref() == Some(token.as_str()) {
            *user = Some(profile.clone());
        }

        Ok(profile)
    }

    /// Restore a session from durable storage at startup.
    ///
    /// A stored token makes the session provisionally authenticated. The
    /// profile is then fetched: a rejection clears the token, any other
    /// failure keeps it and leaves the profile absent.
    pub async fn restore(&self) -> SessionState {
        let Some(token) = self.credentials.get().await else {
            debug!("No stored session token");
            return SessionState::Anonymous;
        };

        match self.fetch_profile().await {
            Ok(profile) => {
                info!(email = %profile.email, role = %profile.role, "Session restored");
                SessionState::Authenticated(profile)
            }
            Err(e) if e.is_session_ending() => {
                self.expire(&token).await;
                SessionState::Expired
            }
            Err(e) => {
                warn!(error = %e, "Could not recover profile, continuing without it");
                SessionState::Provisional
            }
        }
    }

    async fn post_credentials<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback_message: &str,
        operation: &str,
    ) -> TaskdeckResult<AuthResponse> {
        let response = self
            .client
            .post(endpoint_url(&self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(e, "session", operation))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| network_error(e, "session", operation))?;

        if !status.is_success() {
            let message = server_message(&text).unwrap_or_else(|| fallback_message.to_string());
            warn!(status = status.as_u16(), operation, "Identity endpoint rejected request");
            return Err(TaskdeckError::Authentication {
                message,
                context: ErrorContext::new("session")
                    .with_operation(operation)
                    .with_metadata("status", status.as_str()),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn establish(&self, response: AuthResponse) -> TaskdeckResult<UserProfile> {
        let mut user = self.user.write().await;
        *user = Some(response.user.clone());
        self.credentials.set(&response.access_token).await?;

        info!(
            email = %response.user.email,
            role = %response.user.role,
            "Session established"
        );
        Ok(response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SessionService {
        SessionService::new(&TaskdeckConfig::default(), Arc::new(CredentialStore::in_memory()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_session_is_anonymous() {
        let session = service();
        assert!(!session.is_authenticated().await);
        assert_eq!(session.current_user().await, None);
        assert_eq!(session.restore().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_fetch_profile_requires_token() {
        let session = service();
        let err = session.fetch_profile().await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication error: No authentication token");
    }

    #[tokio::test]
    async fn test_expire_only_matches_active_token() {
        let session = service();
        session.credentials().set("active").await.unwrap();

        assert!(!session.expire("stale").await);
        assert!(session.is_authenticated().await);

        assert!(session.expire("active").await);
        assert!(!session.expire("active").await);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let session = service();
        session.logout().await;
        session.credentials().set("tok").await.unwrap();
        session.logout().await;
        session.logout().await;
        assert!(!session.is_authenticated().await);
    }
}
