//! Blog lifecycle: selection, colors, vaulted passwords, deletion and saves
//!
//! [`BlogSync`] wraps the record store instead of replacing it. Each save
//! first mirrors the record to the main process, then hands it to the store.
//! Deletion removes the vaulted password before the record is purged.

use std::sync::Arc;

use crate::color::{ColorPicker, IconColor, PaletteColorPicker};
use crate::error::SyncError;
use crate::ipc::{Messenger, BLOG_SERIALIZED_CHANNEL};
use crate::models::Blog;
use crate::site_name::SiteNameResolver;
use crate::storage::{CredentialStore, RecordStore};

const DEFAULT_COLOR_RETRY_LIMIT: u32 = 32;

pub struct BlogSync {
    store: Arc<dyn RecordStore>,
    credentials: CredentialStore,
    messenger: Arc<dyn Messenger>,
    resolver: Arc<dyn SiteNameResolver>,
    colors: Arc<dyn ColorPicker>,
    color_retry_limit: u32,
}

impl BlogSync {
    pub fn new(
        store: Arc<dyn RecordStore>,
        credentials: CredentialStore,
        messenger: Arc<dyn Messenger>,
        resolver: Arc<dyn SiteNameResolver>,
    ) -> Self {
        Self {
            store,
            credentials,
            messenger,
            resolver,
            colors: Arc::new(PaletteColorPicker),
            color_retry_limit: DEFAULT_COLOR_RETRY_LIMIT,
        }
    }

    pub fn with_color_picker(mut self, colors: Arc<dyn ColorPicker>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_color_retry_limit(mut self, limit: u32) -> Self {
        self.color_retry_limit = limit.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn colors(&self) -> &Arc<dyn ColorPicker> {
        &self.colors
    }

    /// Mark the blog as selected and save it
    pub async fn select(&self, blog: &mut Blog) -> Result<(), SyncError> {
        if blog.is_gone() {
            return Ok(());
        }
        blog.set_selected(true);
        self.save(blog).await
    }

    /// Mark the blog as not selected and save it
    pub async fn unselect(&self, blog: &mut Blog) -> Result<(), SyncError> {
        if blog.is_gone() {
            return Ok(());
        }
        blog.set_selected(false);
        self.save(blog).await
    }

    /// Assign a new icon color different from the current one and from
    /// `excluding`. Does not save.
    pub fn randomize_color(&self, blog: &mut Blog, excluding: Option<&IconColor>) {
        let current = blog.icon_color().clone();
        let mut candidate = self.colors.pick(excluding);
        let mut attempts = 1;

        while candidate == current && attempts < self.color_retry_limit {
            candidate = self.colors.pick(excluding);
            attempts += 1;
        }

        if candidate == current {
            tracing::warn!(
                "Color picker kept returning {} after {} attempts",
                current,
                attempts
            );
        }
        blog.set_icon_color(candidate);
    }

    pub async fn set_password(&self, blog: &Blog, secret: &str) -> Result<(), SyncError> {
        self.credentials
            .set_password(blog.url(), blog.identification(), secret)
            .await?;
        Ok(())
    }

    /// The vaulted password, or `None` when the blog has no url or identification
    pub async fn get_password(&self, blog: &Blog) -> Result<Option<String>, SyncError> {
        Ok(self
            .credentials
            .get_password(blog.url(), blog.identification())
            .await?)
    }

    /// Refresh the display name from the blog's homepage; failures keep the old name
    pub async fn update_name(&self, blog: &mut Blog) {
        let url = blog.url().to_string();
        if url.is_empty() {
            return;
        }

        match self.resolver.fetch_site_name(&url).await {
            Ok(name) => blog.set_name(name),
            Err(err) => tracing::debug!("Tried to update blog name, but failed: {}", err),
        }
    }

    /// Mark the blog deleted and drop its vaulted password.
    ///
    /// The password is gone for good: a later [`Blog::rollback`] brings the
    /// record back but not its password.
    pub async fn delete_record(&self, blog: &mut Blog) -> Result<(), SyncError> {
        let url = blog.url().to_string();
        let identification = blog.identification().to_string();

        blog.mark_deleted();
        self.credentials
            .delete_password(&url, &identification)
            .await?;
        Ok(())
    }

    /// Remove a deleted blog from the store
    pub async fn purge(&self, blog: &mut Blog) -> Result<(), SyncError> {
        if !blog.is_deleted() || blog.is_destroyed() {
            return Ok(());
        }

        blog.mark_being_destroyed(true);
        match self.store.delete(blog.id()).await {
            Ok(()) => {
                blog.mark_destroyed();
                tracing::debug!("Purged blog {}", blog.id());
                Ok(())
            }
            Err(err) => {
                blog.mark_being_destroyed(false);
                Err(SyncError::Persistence(err))
            }
        }
    }

    pub async fn destroy_record(&self, blog: &mut Blog) -> Result<(), SyncError> {
        self.delete_record(blog).await?;
        self.purge(blog).await
    }

    /// Notify the main process, then persist
    pub async fn save(&self, blog: &mut Blog) -> Result<(), SyncError> {
        if blog.is_gone() {
            return Ok(());
        }

        let payload = blog.to_payload(true);
        if let Err(err) = self.messenger.send(BLOG_SERIALIZED_CHANNEL, payload) {
            tracing::warn!("Failed to notify main process about blog {}: {}", blog.id(), err);
        }

        self.store
            .save(blog.id(), blog.attrs())
            .await
            .map_err(SyncError::Persistence)?;
        blog.mark_persisted();
        Ok(())
    }
}
