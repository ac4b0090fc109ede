use thiserror::Error;

use crate::models::BlogId;
use crate::storage::CredentialError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("Failed to persist blog: {0}")]
    Persistence(#[source] anyhow::Error),
    #[error("A blog for {0} already exists")]
    DuplicateBlog(String),
    #[error("Invalid blog url: {0}")]
    InvalidUrl(String),
    #[error("No blog with id {0}")]
    NotFound(BlogId),
}
