pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod monitor;
pub mod orchestrator;
pub mod seed;
pub mod storage;
pub mod types;

// Re-export primary types for convenience
pub use config::{EngineConfig, GatewayConfig};
pub use conversation::ConversationManager;
pub use error::{EngineError, GatewayError};
pub use gateway::{AiGateway, EvidenceAssessment, GatewayInfo, GeminiGateway};
pub use identity::{Identity, IdentityProvider, LocalIdentityProvider};
pub use monitor::SystemMonitor;
pub use orchestrator::{Orchestrator, UNTRAINED_ADVISORY};
pub use storage::{
    AnalyticsSink, ChatHistoryStore, EventLog, LocalStores, MetadataStore, ObjectStore,
    VectorIndexStore,
};
pub use types::{
    AgentResponse, AnalysisResult, ChatMessage, ChatRole, ChatTurn, EvidenceKind, EvidencePayload,
    HealthStatus, Industry, IngestedDocument, Policy, ResponseMetadata, RiskLevel, SessionContext,
    SourceCitation, StorageUsage, SystemHealth, VerificationReport, Violation,
};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;
