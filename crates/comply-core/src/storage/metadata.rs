//! Policy metadata store backed by a single JSON table file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::MetadataStore;
use crate::types::Policy;

const TABLE_FILE: &str = "policies.json";

pub struct LocalMetadataStore {
    path: PathBuf,
    rows: RwLock<Vec<Policy>>,
}

impl LocalMetadataStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TABLE_FILE),
            rows: RwLock::new(Vec::new()),
        }
    }

    fn persist(&self, rows: &[Policy]) -> Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for LocalMetadataStore {
    async fn open(&self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let rows: Vec<Policy> =
                serde_json::from_str(&content).context("Failed to parse policy table")?;
            *self.rows.write() = rows;
        }
        tracing::debug!(rows = self.row_count(), "metadata store opened");
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Policy>> {
        Ok(self.rows.read().clone())
    }

    async fn save(&self, policy: &Policy) -> Result<()> {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|p| p.id == policy.id) {
            Some(existing) => *existing = policy.clone(),
            None => rows.insert(0, policy.clone()),
        }
        self.persist(&rows)?;
        tracing::info!(policy_id = %policy.id, "metadata commit");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        if rows.len() != before {
            self.persist(&rows)?;
            tracing::info!(policy_id = %id, "metadata record deleted");
        }
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    async fn close(&self) -> Result<()> {
        let rows = self.rows.read();
        self.persist(&rows)
    }
}
