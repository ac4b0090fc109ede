//! BlogDesk core
//!
//! Blog records for a desktop client that aggregates several publishing
//! sites. Passwords live in the OS keychain rather than on the record, and
//! every save is mirrored to the privileged main process.

pub mod collection;
pub mod color;
pub mod config;
pub mod error;
pub mod ipc;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod site_name;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

pub use collection::BlogList;
pub use config::Settings;
pub use error::SyncError;
pub use lifecycle::BlogSync;

use ipc::Messenger;
use site_name::HttpSiteNameResolver;
use storage::{credentials, CredentialStore, JsonFileStore};

/// Wire up a [`BlogSync`] from settings: file-backed records, the detected
/// credential store (installed process-wide) and the HTTP name resolver.
pub async fn build_sync(settings: &Settings, messenger: Arc<dyn Messenger>) -> BlogSync {
    let store = match credentials::global() {
        Some(store) => store.clone(),
        None => {
            let detected = CredentialStore::detect(settings).await;
            match credentials::init(detected.clone()) {
                Ok(installed) => installed.clone(),
                Err(_) => detected,
            }
        }
    };
    tracing::info!(
        "Credential store {}",
        if store.is_available() {
            "ready"
        } else {
            "unavailable, passwords will not be kept"
        }
    );

    BlogSync::new(
        Arc::new(JsonFileStore::new(&settings.data_dir)),
        store,
        messenger,
        Arc::new(HttpSiteNameResolver::new(Duration::from_secs(
            settings.name_fetch_timeout_secs,
        ))),
    )
    .with_color_retry_limit(settings.color_retry_limit)
}
