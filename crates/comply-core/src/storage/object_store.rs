//! Blob store writing objects to a local directory tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;

use super::ObjectStore;

const BUCKET: &str = "compliance-objects";
const OBJECTS_DIR: &str = "objects";

pub struct LocalObjectStore {
    root: PathBuf,
    // key -> on-disk path, rebuilt from the directory tree on open
    index: DashMap<String, PathBuf>,
}

impl LocalObjectStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join(OBJECTS_DIR),
            index: DashMap::new(),
        }
    }

    fn scan(&self, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.scan(&path)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key = relative.to_string_lossy().replace('\\', "/");
                self.index.insert(key, path);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn open(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        self.index.clear();
        let root = self.root.clone();
        self.scan(&root)?;
        tracing::debug!(objects = self.index.len(), "object store opened");
        Ok(())
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        // Keys are slash-separated paths like "policies/handbook.pdf"; reject
        // anything that could escape the bucket root.
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            anyhow::bail!("invalid object key: {key}");
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write object {key}"))?;
        self.index.insert(key.to_string(), path);

        let uri = format!("local://{BUCKET}/{key}");
        tracing::info!(uri = %uri, size = bytes.len(), "object stored");
        Ok(uri)
    }

    fn object_count(&self) -> usize {
        self.index.len()
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
