//! Per-policy chat history, one JSON map file keyed by policy id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::ChatHistoryStore;
use crate::types::ChatMessage;

const HISTORY_FILE: &str = "chat_history.json";

pub struct LocalChatHistoryStore {
    path: PathBuf,
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl LocalChatHistoryStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILE),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn persist(&self, sessions: &HashMap<String, Vec<ChatMessage>>) -> Result<()> {
        let json = serde_json::to_string_pretty(sessions)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ChatHistoryStore for LocalChatHistoryStore {
    async fn open(&self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let sessions: HashMap<String, Vec<ChatMessage>> =
                serde_json::from_str(&content).context("Failed to parse chat history")?;
            *self.sessions.write() = sessions;
        }
        Ok(())
    }

    async fn load(&self, policy_id: &str) -> Result<Option<Vec<ChatMessage>>> {
        Ok(self.sessions.read().get(policy_id).cloned())
    }

    async fn save(&self, policy_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let mut sessions = self.sessions.write();
        sessions.insert(policy_id.to_string(), messages.to_vec());
        self.persist(&sessions)
    }

    async fn clear(&self, policy_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        if sessions.remove(policy_id).is_some() {
            self.persist(&sessions)?;
            tracing::info!(policy_id = %policy_id, "chat history cleared");
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let sessions = self.sessions.read();
        self.persist(&sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_kept_per_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalChatHistoryStore::new(dir.path());
        store.open().await.unwrap();

        store
            .save("p1", &[ChatMessage::user("hello")])
            .await
            .unwrap();
        store
            .save("p2", &[ChatMessage::user("hi"), ChatMessage::model("hey")])
            .await
            .unwrap();

        assert_eq!(store.load("p1").await.unwrap().unwrap().len(), 1);
        assert_eq!(store.load("p2").await.unwrap().unwrap().len(), 2);
        assert!(store.load("p3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_only_the_target_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalChatHistoryStore::new(dir.path());
        store.open().await.unwrap();

        store
            .save("p1", &[ChatMessage::user("hello")])
            .await
            .unwrap();
        store.save("p2", &[ChatMessage::user("hi")]).await.unwrap();
        store.clear("p1").await.unwrap();

        assert!(store.load("p1").await.unwrap().is_none());
        assert!(store.load("p2").await.unwrap().is_some());
    }
}
