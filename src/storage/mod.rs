//! Storage for blog records and their vaulted credentials

pub mod blog_store;
pub mod credentials;
pub mod keyring;

// Re-export commonly used items
pub use blog_store::{JsonFileStore, MemoryStore, RecordStore};
pub use credentials::{
    CredentialBackend, CredentialError, CredentialStore, MemoryBackend, UnavailableBackend,
};
pub use self::keyring::KeyringBackend;
