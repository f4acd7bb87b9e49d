//! Credential Store - the single authority for the session token
//!
//! The token is opaque and never inspected. It lives in memory and in a
//! durable slot so a restart restores the session without a new login.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskdeck_core::{ErrorContext, TaskdeckError, TaskdeckResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Durable backing for the token slot
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Read the stored token, `None` when the slot is empty
    async fn load(&self) -> TaskdeckResult<Option<String>>;

    /// Overwrite the slot
    async fn save(&self, token: &str) -> TaskdeckResult<()>;

    /// Empty the slot; clearing an empty slot is not an error
    async fn clear(&self) -> TaskdeckResult<()>;
}

/// Plain-text token file
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, operation: &str, error: std::io::Error) -> TaskdeckError {
        TaskdeckError::Storage {
            message: format!("Token file {}: {}", self.path.display(), error),
            source: Some(Box::new(error)),
            context: ErrorContext::new("token_storage")
                .with_operation(operation)
                .with_suggestion("Check that the session.token_file location is writable"),
        }
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> TaskdeckResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error("load", e)),
        }
    }

    async fn save(&self, token: &str) -> TaskdeckResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.storage_error("create_dir", e))?;
            }
        }

        tokio::fs::write(&self.path, token)
            .await
            .map_err(|e| self.storage_error("save", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error("set_permissions", e))?;
        }

        debug!("Saved session token to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> TaskdeckResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed session token file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("clear", e)),
        }
    }
}

/// Process-local storage, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds a token, as after a previous login
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    pub async fn peek(&self) -> Option<String> {
        self.token.lock().await.clone()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> TaskdeckResult<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> TaskdeckResult<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> TaskdeckResult<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

#[derive(Debug)]
enum TokenSlot {
    /// Durable storage not read yet
    Unloaded,
    Loaded(Option<String>),
}

/// In-memory token cache over a durable [`TokenStorage`]
pub struct CredentialStore {
    storage: Arc<dyn TokenStorage>,
    slot: RwLock<TokenSlot>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the token
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            storage,
            slot: RwLock::new(TokenSlot::Unloaded),
        }
    }

    /// Store backed by a token file
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self::new(Arc::new(FileTokenStorage::new(path)))
    }

    /// Store with no durable backing beyond the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStorage::new()))
    }

    async fn load_slot(&self, slot: &mut TokenSlot) -> Option<String> {
        if let TokenSlot::Loaded(token) = slot {
            return token.clone();
        }

        let token = match self.storage.load().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session token, treating as absent");
                None
            }
        };
        debug!(present = token.is_some(), "Loaded session token from storage");
        *slot = TokenSlot::Loaded(token.clone());
        token
    }

    /// Current token; the first call reads durable storage
    pub async fn get(&self) -> Option<String> {
        {
            let slot = self.slot.read().await;
            if let TokenSlot::Loaded(token) = &*slot {
                return token.clone();
            }
        }

        let mut slot = self.slot.write().await;
        self.load_slot(&mut slot).await
    }

    /// Replace the token in memory and in durable storage.
    ///
    /// The in-memory value is updated even if persisting fails, so the
    /// current process stays signed in; the storage error is returned.
    pub async fn set(&self, token: &str) -> TaskdeckResult<()> {
        let mut slot = self.slot.write().await;
        *slot = TokenSlot::Loaded(Some(token.to_string()));
        self.storage.save(token).await
    }

    /// Remove the token from memory and durable storage. Never fails.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = TokenSlot::Loaded(None);
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "Failed to remove stored session token");
        }
    }

    /// Clear only if `presented` is still the active token.
    ///
    /// Returns true when this call removed it. Concurrent callers holding the
    /// same stale token see exactly one `true`.
    pub async fn clear_if_current(&self, presented: &str) -> bool {
        let mut slot = self.slot.write().await;
        let current = self.load_slot(&mut slot).await;
        if current.as_deref() != Some(presented) {
            return false;
        }

        *slot = TokenSlot::Loaded(None);
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "Failed to remove stored session token");
        }
        true
    }

    /// Presence check only; the server decides validity
    pub async fn has_token(&self) -> bool {
        self.get().await.is_some()
    }
}
