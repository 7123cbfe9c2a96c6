use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered severity classification applied to individual violations and to a
/// whole analysis result. Serialized with the upper-case labels the model is
/// constrained to emit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parse a model-supplied label. Unrecognized or missing values clamp to
    /// the lowest severity rather than failing the whole analysis.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            "CRITICAL" => Self::Critical,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Industry {
    Manufacturing,
    Healthcare,
    Finance,
    Retail,
    Logistics,
    Construction,
    Technology,
    Energy,
    General,
}

/// A compliance document plus its extracted machine-checkable rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub rules: Vec<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    /// True once a retrieval index has been built over the content. Gates
    /// conversational queries.
    #[serde(default)]
    pub indexed: bool,
}

impl Policy {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            rules: Vec::new(),
            last_updated: Utc::now(),
            industry: None,
            indexed: false,
        }
    }

    /// Replace the document body with freshly ingested content. Any existing
    /// retrieval index no longer matches the content, so the indexed flag is
    /// dropped until the policy is trained again.
    pub fn apply_ingested(&mut self, document: &IngestedDocument) {
        self.content = document.text.clone();
        self.rules = document.rules.clone();
        self.last_updated = Utc::now();
        self.indexed = false;
    }
}

/// Output of the gateway's document-ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub text: String,
    pub rules: Vec<String>,
}

/// Output of the web-grounded verification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub summary: String,
    pub sources: Vec<SourceCitation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub description: String,
    pub severity: RiskLevel,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Image,
    Log,
}

/// Evidence submitted for violation analysis against an active policy.
#[derive(Debug, Clone)]
pub enum EvidencePayload {
    Image {
        bytes: Vec<u8>,
        filename: Option<String>,
    },
    Log {
        text: String,
        filename: Option<String>,
    },
}

impl EvidencePayload {
    pub fn kind(&self) -> EvidenceKind {
        match self {
            Self::Image { .. } => EvidenceKind::Image,
            Self::Log { .. } => EvidenceKind::Log,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Image { filename, .. } | Self::Log { filename, .. } => filename.as_deref(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "Image Evidence",
            Self::Log { .. } => "Log/Text Evidence",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Image { bytes, .. } => bytes,
            Self::Log { text, .. } => text.as_bytes(),
        }
    }
}

/// One completed evidence analysis. Immutable after creation; appended to the
/// analytics sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub evidence_name: String,
    pub evidence_kind: EvidenceKind,
    pub overall_risk: RiskLevel,
    /// Compliance score, 0-100 where 100 is fully compliant.
    pub score: f32,
    pub summary: String,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a per-policy conversation, persisted keyed by policy id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Model,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Minimal view of a conversation turn sent over the gateway wire. Synthetic
/// greeting turns never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Per-request context supplied by the caller (the console view layer).
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session_id: String,
    pub active_policy: Option<Policy>,
}

impl SessionContext {
    pub fn with_policy(session_id: impl Into<String>, policy: Policy) -> Self {
        Self {
            session_id: session_id.into(),
            active_policy: Some(policy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

/// Row/object counts aggregated from the storage ports.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub metadata_rows: usize,
    pub vector_count: usize,
    pub object_count: usize,
    pub analytics_rows: usize,
    pub event_rows: usize,
}

/// Derived health snapshot. Recomputed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub active_jobs: usize,
    pub storage: StorageUsage,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Uniform result envelope returned by every orchestrator operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl<T> AgentResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            metadata: None,
        }
    }

    pub fn ok_with(data: T, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            metadata: Some(metadata),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            metadata: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
