//! Credential store adapter
//!
//! A blog's password never sits on the record itself. It is kept in a
//! [`CredentialBackend`] under `(service = url, account = identification)`.
//! [`CredentialStore`] picks the backend once at startup and hides whether
//! the native keyring was reachable: callers get the same interface either
//! way, with the null backend answering "nothing stored".

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::keyring::KeyringBackend;
use crate::config::Settings;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential backend error: {0}")]
    Backend(String),
    #[error("Credential task failed: {0}")]
    Task(String),
    #[error("Credential store already initialized")]
    AlreadyInitialized,
}

#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Create or replace the secret for `(service, account)`
    async fn set_password(
        &self,
        service: &str,
        account: &str,
        secret: &str,
    ) -> Result<(), CredentialError>;

    async fn get_password(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<String>, CredentialError>;

    /// Returns whether anything was removed
    async fn delete_password(&self, service: &str, account: &str) -> Result<bool, CredentialError>;

    fn is_available(&self) -> bool;
}

/// Stand-in used when no native store could be loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl CredentialBackend for UnavailableBackend {
    async fn set_password(&self, _: &str, _: &str, _: &str) -> Result<(), CredentialError> {
        Ok(())
    }

    async fn get_password(&self, _: &str, _: &str) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }

    async fn delete_password(&self, _: &str, _: &str) -> Result<bool, CredentialError> {
        Ok(false)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// In-process secret map
#[derive(Debug, Default)]
pub struct MemoryBackend {
    secrets: Mutex<HashMap<(String, String), String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(service: &str, account: &str) -> (String, String) {
        (service.to_string(), account.to_string())
    }

    fn poisoned() -> CredentialError {
        CredentialError::Backend("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl CredentialBackend for MemoryBackend {
    async fn set_password(
        &self,
        service: &str,
        account: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        let mut secrets = self.secrets.lock().map_err(|_| Self::poisoned())?;
        secrets.insert(Self::key(service, account), secret.to_string());
        Ok(())
    }

    async fn get_password(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<String>, CredentialError> {
        let secrets = self.secrets.lock().map_err(|_| Self::poisoned())?;
        Ok(secrets.get(&Self::key(service, account)).cloned())
    }

    async fn delete_password(&self, service: &str, account: &str) -> Result<bool, CredentialError> {
        let mut secrets = self.secrets.lock().map_err(|_| Self::poisoned())?;
        Ok(secrets.remove(&Self::key(service, account)).is_some())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Uniform access to vaulted passwords
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn CredentialBackend>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self { backend }
    }

    /// Store that answers every call with its fallback
    pub fn unavailable() -> Self {
        Self::new(Arc::new(UnavailableBackend))
    }

    /// Keyring-backed store if the platform keyring answers, null store otherwise
    pub async fn detect(settings: &Settings) -> Self {
        if settings.disable_keychain {
            tracing::info!("Keychain disabled by settings, passwords will not be stored");
            return Self::unavailable();
        }

        if KeyringBackend::probe().await {
            Self::new(Arc::new(KeyringBackend::new()))
        } else {
            Self::unavailable()
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub async fn set_password(
        &self,
        service: &str,
        account: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        if service.is_empty() || account.is_empty() {
            tracing::debug!("Not storing password without url and identification");
            return Ok(());
        }
        self.backend.set_password(service, account, secret).await
    }

    pub async fn get_password(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<String>, CredentialError> {
        if service.is_empty() || account.is_empty() {
            return Ok(None);
        }
        self.backend.get_password(service, account).await
    }

    pub async fn delete_password(&self, service: &str, account: &str) -> Result<(), CredentialError> {
        if service.is_empty() || account.is_empty() {
            return Ok(());
        }
        let removed = self.backend.delete_password(service, account).await?;
        if !removed {
            tracing::debug!("No vaulted password to delete for {} ({})", service, account);
        }
        Ok(())
    }
}

static GLOBAL_STORE: OnceCell<CredentialStore> = OnceCell::new();

/// Install the process-wide credential store
pub fn init(store: CredentialStore) -> Result<&'static CredentialStore, CredentialError> {
    GLOBAL_STORE
        .set(store)
        .map_err(|_| CredentialError::AlreadyInitialized)?;
    GLOBAL_STORE.get().ok_or(CredentialError::AlreadyInitialized)
}

/// The process-wide store, if [`init`] has run
pub fn global() -> Option<&'static CredentialStore> {
    GLOBAL_STORE.get()
}
