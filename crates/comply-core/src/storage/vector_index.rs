//! Vector index stub: tracks which policies are indexed and how many index
//! writes have happened. Computes no embeddings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::VectorIndexStore;

const INDEX_FILE: &str = "vector_index.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexState {
    indexed_ids: HashSet<String>,
    vector_count: usize,
}

pub struct LocalVectorIndex {
    path: PathBuf,
    state: RwLock<IndexState>,
}

impl LocalVectorIndex {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(INDEX_FILE),
            state: RwLock::new(IndexState::default()),
        }
    }

    fn persist(&self, state: &IndexState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndexStore for LocalVectorIndex {
    async fn open(&self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let state: IndexState =
                serde_json::from_str(&content).context("Failed to parse vector index state")?;
            *self.state.write() = state;
        }
        Ok(())
    }

    async fn index_policy(&self, policy_id: &str, content: &str) -> Result<()> {
        let mut state = self.state.write();
        state.indexed_ids.insert(policy_id.to_string());
        // Every index call writes one new vector batch, re-training included.
        state.vector_count += 1;
        self.persist(&state)?;
        tracing::info!(
            policy_id = %policy_id,
            content_len = content.len(),
            vectors = state.vector_count,
            "policy content indexed"
        );
        Ok(())
    }

    fn is_indexed(&self, policy_id: &str) -> bool {
        self.state.read().indexed_ids.contains(policy_id)
    }

    fn vector_count(&self) -> usize {
        self.state.read().vector_count
    }

    async fn close(&self) -> Result<()> {
        let state = self.state.read();
        self.persist(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn index_marks_policy_and_counts_writes() {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalVectorIndex::new(dir.path());
        index.open().await.unwrap();

        assert!(!index.is_indexed("p1"));
        index.index_policy("p1", "content").await.unwrap();
        index.index_policy("p1", "content v2").await.unwrap();

        assert!(index.is_indexed("p1"));
        assert_eq!(index.vector_count(), 2);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let index = LocalVectorIndex::new(dir.path());
        index.open().await.unwrap();
        index.index_policy("p1", "content").await.unwrap();
        index.close().await.unwrap();

        let reopened = LocalVectorIndex::new(dir.path());
        reopened.open().await.unwrap();
        assert!(reopened.is_indexed("p1"));
        assert_eq!(reopened.vector_count(), 1);
    }
}
