//! Collection-level flows: add, exclusive selection, removal, reload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use blogdesk_lib::ipc::{BlogMirror, ChannelMessenger};
use blogdesk_lib::models::{BlogAttrs, BlogId};
use blogdesk_lib::site_name::SiteNameResolver;
use blogdesk_lib::storage::{
    CredentialStore, JsonFileStore, MemoryBackend, MemoryStore, RecordStore,
};
use blogdesk_lib::{BlogList, BlogSync, SyncError};
use tempfile::tempdir;

struct Offline;

#[async_trait]
impl SiteNameResolver for Offline {
    async fn fetch_site_name(&self, url: &str) -> Result<String, anyhow::Error> {
        Err(anyhow::anyhow!("offline: {url}"))
    }
}

/// Memory store whose writes can be switched off
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_save: AtomicBool,
    fail_delete: AtomicBool,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn save(&self, id: &BlogId, attrs: &BlogAttrs) -> anyhow::Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.save(id, attrs).await
    }

    async fn delete(&self, id: &BlogId) -> anyhow::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.delete(id).await
    }

    async fn load_all(&self) -> anyhow::Result<Vec<(BlogId, BlogAttrs)>> {
        self.inner.load_all().await
    }
}

fn flaky_list(store: Arc<FlakyStore>, backend: Arc<MemoryBackend>) -> BlogList {
    let (messenger, _rx) = ChannelMessenger::new();
    BlogList::new(BlogSync::new(
        store,
        CredentialStore::new(backend),
        Arc::new(messenger),
        Arc::new(Offline),
    ))
}

fn sync_for(
    dir: &std::path::Path,
    credentials: CredentialStore,
    messenger: ChannelMessenger,
) -> BlogSync {
    BlogSync::new(
        Arc::new(JsonFileStore::new(dir)),
        credentials,
        Arc::new(messenger),
        Arc::new(Offline),
    )
}

#[tokio::test]
async fn add_select_remove_and_reload() {
    let dir = tempdir().expect("tempdir");
    let credentials = CredentialStore::new(Arc::new(MemoryBackend::new()));
    let (messenger, rx) = ChannelMessenger::new();
    let mut blogs = BlogList::new(sync_for(dir.path(), credentials.clone(), messenger));

    let first = blogs
        .add("first.example", "me", Some("pw-1"))
        .await
        .expect("add first")
        .clone();
    let second = blogs
        .add("https://second.example/", "me", None)
        .await
        .expect("add second")
        .clone();

    assert_eq!(first.url(), "https://first.example");
    assert_eq!(first.name(), "first.example");
    assert_eq!(first.index(), 0);
    assert_eq!(second.index(), 1);
    assert_ne!(first.icon_color(), second.icon_color());
    assert_eq!(
        blogs.sync().get_password(&first).await.unwrap().as_deref(),
        Some("pw-1")
    );

    assert!(matches!(
        blogs.add("https://first.example", "other", None).await,
        Err(SyncError::DuplicateBlog(_))
    ));

    blogs.select_only(first.id()).await.expect("select first");
    blogs.select_only(second.id()).await.expect("select second");
    assert_eq!(blogs.selected().map(|b| b.id()), Some(second.id()));
    assert_eq!(blogs.blogs().iter().filter(|b| b.is_selected()).count(), 1);

    let removed = blogs.remove(first.id()).await.expect("remove first");
    assert!(removed.is_destroyed());
    assert_eq!(
        credentials
            .get_password("https://first.example", "me")
            .await
            .unwrap(),
        None
    );

    let (messenger, _rx) = ChannelMessenger::new();
    let reloaded = BlogList::load(sync_for(dir.path(), credentials, messenger))
        .await
        .expect("reload");
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.blogs()[0].id(), second.id());
    assert!(reloaded.blogs()[0].is_selected());
    assert!(!reloaded.blogs()[0].has_dirty_attributes());

    drop(blogs);
    let mut mirror = BlogMirror::new();
    mirror.run(rx).await;
    assert_eq!(mirror.len(), 2);
    assert_eq!(
        mirror.selected().and_then(|b| b["id"].as_str()),
        Some(second.id().as_str())
    );
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let dir = tempdir().expect("tempdir");
    let (messenger, _rx) = ChannelMessenger::new();
    let mut blogs = BlogList::new(sync_for(
        dir.path(),
        CredentialStore::unavailable(),
        messenger,
    ));

    let missing = BlogId::from("missing");
    assert!(matches!(
        blogs.select_only(&missing).await,
        Err(SyncError::NotFound(_))
    ));
    assert!(matches!(
        blogs.remove(&missing).await,
        Err(SyncError::NotFound(_))
    ));
}

#[tokio::test]
async fn failed_add_leaves_no_vaulted_password() {
    let store = Arc::new(FlakyStore::default());
    store.fail_save.store(true, Ordering::SeqCst);
    let backend = Arc::new(MemoryBackend::new());
    let mut blogs = flaky_list(store, backend.clone());

    assert!(matches!(
        blogs.add("a.example", "me", Some("hunter2")).await,
        Err(SyncError::Persistence(_))
    ));
    assert!(blogs.is_empty());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn failed_remove_is_not_reported_as_selected_and_can_be_retried() {
    let store = Arc::new(FlakyStore::default());
    let backend = Arc::new(MemoryBackend::new());
    let mut blogs = flaky_list(store.clone(), backend.clone());

    let id = blogs
        .add("a.example", "me", Some("hunter2"))
        .await
        .expect("add")
        .id()
        .clone();
    blogs.select_only(&id).await.expect("select");
    assert!(blogs.selected().is_some());

    store.fail_delete.store(true, Ordering::SeqCst);
    assert!(matches!(
        blogs.remove(&id).await,
        Err(SyncError::Persistence(_))
    ));
    assert!(blogs.get(&id).expect("still listed").is_deleted());
    assert!(blogs.selected().is_none());
    assert!(backend.is_empty());

    store.fail_delete.store(false, Ordering::SeqCst);
    let removed = blogs.remove(&id).await.expect("retry remove");
    assert!(removed.is_destroyed());
    assert!(blogs.is_empty());
    assert_eq!(store.inner.len().await, 0);
}
