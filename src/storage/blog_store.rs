use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};

use crate::models::{BlogAttrs, BlogId};

const BLOGS_FILENAME: &str = "blogs.json";

/// Persistence for the non-secret part of blog records
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, id: &BlogId, attrs: &BlogAttrs) -> Result<()>;

    async fn delete(&self, id: &BlogId) -> Result<()>;

    async fn load_all(&self) -> Result<Vec<(BlogId, BlogAttrs)>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<BlogId, BlogAttrs>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &BlogId) -> Option<BlogAttrs> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, id: &BlogId, attrs: &BlogAttrs) -> Result<()> {
        self.records.write().await.insert(id.clone(), attrs.clone());
        Ok(())
    }

    async fn delete(&self, id: &BlogId) -> Result<()> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(BlogId, BlogAttrs)>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(id, attrs)| (id.clone(), attrs.clone()))
            .collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlogsFile {
    updated_at: String,
    blogs: HashMap<BlogId, BlogAttrs>,
}

impl BlogsFile {
    fn new() -> Self {
        Self {
            updated_at: Utc::now().to_rfc3339(),
            blogs: HashMap::new(),
        }
    }
}

/// All blogs in one JSON document under the data directory
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self::at_path(data_dir.join(BLOGS_FILENAME))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store. Anything else that stops the file
    /// from being read is an error, so a damaged file is never written over.
    fn load(&self) -> Result<BlogsFile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BlogsFile::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        serde_json::from_str(&contents)
            .with_context(|| format!("Blog file {} is damaged", self.path.display()))
    }

    /// Replace the file through a sibling temp file and a rename
    fn write(&self, mut file: BlogsFile) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).context("Failed to create blog data directory")?;

        file.updated_at = Utc::now().to_rfc3339();
        let payload = serde_json::to_string_pretty(&file).context("Failed to serialize blogs")?;

        let mut tmp = NamedTempFile::new_in(dir).context("Failed to create temp blog file")?;
        tmp.write_all(payload.as_bytes())
            .context("Failed to write temp blog file")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush temp blog file")?;
        tmp.persist(&self.path)
            .context("Failed to replace blogs file")?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn save(&self, id: &BlogId, attrs: &BlogAttrs) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load()?;
        file.blogs.insert(id.clone(), attrs.clone());
        self.write(file)
    }

    async fn delete(&self, id: &BlogId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load()?;
        if file.blogs.remove(id).is_some() {
            self.write(file)?;
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(BlogId, BlogAttrs)>> {
        Ok(self.load()?.blogs.into_iter().collect())
    }
}
