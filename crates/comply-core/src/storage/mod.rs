//! Storage ports and their local stub implementations.
//!
//! Each port is an injectable trait with an explicit open/close lifecycle so a
//! real database, object store, or vector index can be swapped in behind the
//! same contract without touching the orchestrator. The local implementations
//! keep state in memory and persist it to JSON files under the configured data
//! directory. No port enforces referential integrity across the others; the
//! orchestrator is responsible for ordering writes, and no port retries.

pub mod analytics;
pub mod chat_history;
pub mod event_log;
pub mod metadata;
pub mod object_store;
pub mod vector_index;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AnalysisResult, ChatMessage, Policy};

pub use analytics::LocalAnalyticsSink;
pub use chat_history::LocalChatHistoryStore;
pub use event_log::LocalEventLog;
pub use metadata::LocalMetadataStore;
pub use object_store::LocalObjectStore;
pub use vector_index::LocalVectorIndex;

/// Unstructured blob storage (uploaded documents, evidence files).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn open(&self) -> Result<()>;
    /// Store a blob under the given key and return its URI.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;
    fn object_count(&self) -> usize;
    async fn close(&self) -> Result<()>;
}

/// Transactional policy metadata. Upsert inserts new records at the front,
/// updates in place otherwise.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn open(&self) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<Policy>>;
    async fn save(&self, policy: &Policy) -> Result<()>;
    /// Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
    fn row_count(&self) -> usize;
    async fn close(&self) -> Result<()>;
}

/// Retrieval index over policy content. The local stub records which policies
/// have been indexed and counts index writes; it computes no embeddings.
#[async_trait]
pub trait VectorIndexStore: Send + Sync {
    async fn open(&self) -> Result<()>;
    async fn index_policy(&self, policy_id: &str, content: &str) -> Result<()>;
    fn is_indexed(&self, policy_id: &str) -> bool;
    fn vector_count(&self) -> usize;
    async fn close(&self) -> Result<()>;
}

/// Generic relational event log for audit rows.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn open(&self) -> Result<()>;
    async fn append(&self, event: &str) -> Result<()>;
    fn row_count(&self) -> usize;
    async fn close(&self) -> Result<()>;
}

/// Append-oriented analytics sink for completed analyses, newest first.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn open(&self) -> Result<()>;
    async fn insert(&self, result: &AnalysisResult) -> Result<()>;
    async fn query(&self) -> Result<Vec<AnalysisResult>>;
    fn row_count(&self) -> usize;
    async fn close(&self) -> Result<()>;
}

/// Per-policy conversation history, keyed by policy id.
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn open(&self) -> Result<()>;
    async fn load(&self, policy_id: &str) -> Result<Option<Vec<ChatMessage>>>;
    async fn save(&self, policy_id: &str, messages: &[ChatMessage]) -> Result<()>;
    async fn clear(&self, policy_id: &str) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// The full set of local ports, opened together against one data directory.
pub struct LocalStores {
    pub objects: Arc<LocalObjectStore>,
    pub metadata: Arc<LocalMetadataStore>,
    pub vectors: Arc<LocalVectorIndex>,
    pub events: Arc<LocalEventLog>,
    pub analytics: Arc<LocalAnalyticsSink>,
    pub chat_history: Arc<LocalChatHistoryStore>,
}

impl LocalStores {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let stores = Self {
            objects: Arc::new(LocalObjectStore::new(data_dir)),
            metadata: Arc::new(LocalMetadataStore::new(data_dir)),
            vectors: Arc::new(LocalVectorIndex::new(data_dir)),
            events: Arc::new(LocalEventLog::new(data_dir)),
            analytics: Arc::new(LocalAnalyticsSink::new(data_dir)),
            chat_history: Arc::new(LocalChatHistoryStore::new(data_dir)),
        };

        stores.objects.open().await?;
        stores.metadata.open().await?;
        stores.vectors.open().await?;
        stores.events.open().await?;
        stores.analytics.open().await?;
        stores.chat_history.open().await?;

        Ok(stores)
    }

    pub async fn close(&self) -> Result<()> {
        self.objects.close().await?;
        self.metadata.close().await?;
        self.vectors.close().await?;
        self.events.close().await?;
        self.analytics.close().await?;
        self.chat_history.close().await?;
        Ok(())
    }
}
