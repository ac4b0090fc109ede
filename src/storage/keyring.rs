//! Vaulted passwords in the operating system keyring

use async_trait::async_trait;
use keyring::Entry;

use super::credentials::{CredentialBackend, CredentialError};

const CHECK_SERVICE: &str = "com.blogdesk.app";
const CHECK_ACCOUNT: &str = "availability-check";

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        CredentialError::Backend(err.to_string())
    }
}

/// Keyring wrapper addressed by `(service, account)`
///
/// Every call opens its own [`Entry`] on the blocking pool, since the
/// platform stores block on IPC to the OS secret service.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringBackend;

impl KeyringBackend {
    pub fn new() -> Self {
        Self
    }

    /// Whether the platform store keeps what is written to it.
    ///
    /// Writes a random token, reads it back through a fresh entry and
    /// removes it again. Stores that accept writes but hand nothing back
    /// (the keyring mock store does this) count as unavailable.
    pub async fn probe() -> bool {
        let result = tokio::task::spawn_blocking(|| {
            verify_roundtrip(|| Entry::new(CHECK_SERVICE, CHECK_ACCOUNT))
        })
        .await;

        match result {
            Ok(Ok(true)) => true,
            Ok(Ok(false)) => {
                tracing::warn!("System keyring does not keep secrets, passwords will not be stored");
                false
            }
            Ok(Err(err)) => {
                tracing::warn!("System keyring unavailable: {}", err);
                false
            }
            Err(err) => {
                tracing::warn!("Keyring check task failed: {}", err);
                false
            }
        }
    }
}

fn verify_roundtrip<F>(open: F) -> Result<bool, keyring::Error>
where
    F: Fn() -> Result<Entry, keyring::Error>,
{
    let token = uuid::Uuid::new_v4().to_string();
    open()?.set_password(&token)?;

    let read_back = match open()?.get_password() {
        Ok(password) => Some(password),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => return Err(e),
    };

    match open()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => {}
        Err(e) => tracing::debug!("Could not remove keyring check entry: {}", e),
    }

    Ok(read_back.as_deref() == Some(token.as_str()))
}

async fn run_blocking<T, F>(f: F) -> Result<T, CredentialError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| CredentialError::Task(err.to_string()))?
}

#[async_trait]
impl CredentialBackend for KeyringBackend {
    async fn set_password(
        &self,
        service: &str,
        account: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        let (service, account, secret) =
            (service.to_string(), account.to_string(), secret.to_string());
        run_blocking(move || {
            let entry = Entry::new(&service, &account)?;
            entry.set_password(&secret)?;
            tracing::debug!("Stored credential for {} ({})", service, account);
            Ok(())
        })
        .await
    }

    async fn get_password(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<String>, CredentialError> {
        let (service, account) = (service.to_string(), account.to_string());
        run_blocking(move || {
            let entry = Entry::new(&service, &account)?;
            match entry.get_password() {
                Ok(password) => Ok(Some(password)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn delete_password(&self, service: &str, account: &str) -> Result<bool, CredentialError> {
        let (service, account) = (service.to_string(), account.to_string());
        run_blocking(move || {
            let entry = Entry::new(&service, &account)?;
            match entry.delete_credential() {
                Ok(()) => {
                    tracing::debug!("Deleted credential for {} ({})", service, account);
                    Ok(true)
                }
                Err(keyring::Error::NoEntry) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    fn is_available(&self) -> bool {
        true
    }
}
