//! The set of blogs the app knows about
//!
//! Exactly one blog is expected to be selected at a time. The entity does
//! not enforce that; [`BlogList::select_only`] does.

use url::Url;

use crate::error::SyncError;
use crate::lifecycle::BlogSync;
use crate::models::{Blog, BlogId};

pub struct BlogList {
    sync: BlogSync,
    blogs: Vec<Blog>,
}

/// Add `https://` when no scheme is given and drop the trailing slash
pub fn normalize_url(raw: &str) -> Result<String, SyncError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidUrl(raw.to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|_| SyncError::InvalidUrl(raw.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(SyncError::InvalidUrl(raw.to_string()));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

impl BlogList {
    pub fn new(sync: BlogSync) -> Self {
        Self {
            sync,
            blogs: Vec::new(),
        }
    }

    /// Load every persisted blog, ordered by index
    pub async fn load(sync: BlogSync) -> Result<Self, SyncError> {
        let mut blogs: Vec<Blog> = sync
            .store()
            .load_all()
            .await
            .map_err(SyncError::Persistence)?
            .into_iter()
            .map(|(id, attrs)| Blog::from_persisted(id, attrs))
            .collect();
        blogs.sort_by_key(Blog::index);
        Ok(Self { sync, blogs })
    }

    pub fn sync(&self) -> &BlogSync {
        &self.sync
    }

    pub fn blogs(&self) -> &[Blog] {
        &self.blogs
    }

    pub fn len(&self) -> usize {
        self.blogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blogs.is_empty()
    }

    pub fn get(&self, id: &BlogId) -> Option<&Blog> {
        self.blogs.iter().find(|b| b.id() == id)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Blog> {
        let url = normalize_url(url).ok()?;
        self.blogs.iter().find(|b| b.url() == url)
    }

    /// The selected blog, skipping any left half-removed by a failed [`remove`](Self::remove)
    pub fn selected(&self) -> Option<&Blog> {
        self.blogs.iter().find(|b| b.is_selected() && !b.is_gone())
    }

    /// Create, vault the password, name and save a new blog
    pub async fn add(
        &mut self,
        url: &str,
        identification: &str,
        password: Option<&str>,
    ) -> Result<&Blog, SyncError> {
        let url = normalize_url(url)?;
        if self.blogs.iter().any(|b| b.url() == url) {
            return Err(SyncError::DuplicateBlog(url));
        }

        let excluding = self.blogs.last().map(|b| b.icon_color().clone());
        let mut blog = Blog::with_color(self.sync.colors().pick(excluding.as_ref()));
        blog.set_index(self.blogs.len() as i64);
        blog.set_url(url.clone());
        blog.set_identification(identification.trim());

        if let Some(password) = password {
            self.sync.set_password(&blog, password).await?;
        }

        self.sync.update_name(&mut blog).await;
        if blog.name().is_empty() {
            let host = Url::parse(&url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| url.clone());
            blog.set_name(host);
        }

        if let Err(err) = self.sync.save(&mut blog).await {
            // No record, so the vaulted password must not outlive it
            if password.is_some() {
                if let Err(cleanup) = self
                    .sync
                    .credentials()
                    .delete_password(blog.url(), blog.identification())
                    .await
                {
                    tracing::warn!(
                        "Could not remove password for unsaved blog {}: {}",
                        blog.url(),
                        cleanup
                    );
                }
            }
            return Err(err);
        }
        tracing::info!("Added blog {} ({})", blog.name(), blog.id());

        self.blogs.push(blog);
        let last = self.blogs.len() - 1;
        Ok(&self.blogs[last])
    }

    /// Select `id` and unselect every other blog.
    ///
    /// Blogs are saved one at a time, so a store error part way through can
    /// leave more than one blog selected. Calling this again repairs that.
    pub async fn select_only(&mut self, id: &BlogId) -> Result<(), SyncError> {
        if self.get(id).is_none() {
            return Err(SyncError::NotFound(id.clone()));
        }

        for blog in self.blogs.iter_mut() {
            if blog.id() == id {
                if !blog.is_selected() || blog.has_dirty_attributes() {
                    self.sync.select(blog).await?;
                }
            } else if blog.is_selected() {
                self.sync.unselect(blog).await?;
            }
        }
        Ok(())
    }

    /// Delete the blog, its vaulted password and its stored record.
    ///
    /// If purging the record fails, the blog stays in the list marked
    /// deleted (its password is already gone) and calling this again retries
    /// the purge.
    pub async fn remove(&mut self, id: &BlogId) -> Result<Blog, SyncError> {
        let position = self
            .blogs
            .iter()
            .position(|b| b.id() == id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;

        self.sync.destroy_record(&mut self.blogs[position]).await?;
        Ok(self.blogs.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_urls() {
        assert_eq!(
            normalize_url("blog.example.com").unwrap(),
            "https://blog.example.com"
        );
        assert_eq!(
            normalize_url(" http://blog.example.com/ ").unwrap(),
            "http://blog.example.com"
        );
        assert_eq!(
            normalize_url("https://example.com/blog/").unwrap(),
            "https://example.com/blog"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(normalize_url(""), Err(SyncError::InvalidUrl(_))));
        assert!(matches!(
            normalize_url("ftp://example.com"),
            Err(SyncError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_url("https://"),
            Err(SyncError::InvalidUrl(_))
        ));
    }
}
