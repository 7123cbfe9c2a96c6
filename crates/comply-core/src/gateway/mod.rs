//! AI gateway: the single seam to the external generative model.
//!
//! Four logical operations, each one request/response exchange. Structured
//! calls (ingestion, evidence analysis) declare a JSON response schema and are
//! decoded through an explicit validate step; verification uses the web-search
//! grounding tool instead (the grounding tool and structured-output mode are
//! mutually exclusive in the underlying model).

pub mod gemini;
pub mod schema;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{
    ChatTurn, EvidencePayload, IngestedDocument, Policy, RiskLevel, VerificationReport, Violation,
};

pub use gemini::GeminiGateway;

/// Model names the gateway routes to, for envelope metadata.
#[derive(Debug, Clone)]
pub struct GatewayInfo {
    pub fast_model: String,
    pub reasoning_model: String,
}

/// Raw evidence assessment as decoded from the model, before the orchestrator
/// turns it into an AnalysisResult.
#[derive(Debug, Clone)]
pub struct EvidenceAssessment {
    pub overall_risk: RiskLevel,
    pub score: f32,
    pub summary: String,
    pub violations: Vec<Violation>,
}

impl EvidenceAssessment {
    /// Documented defaults for a malformed or empty model payload: lowest
    /// risk, fully compliant, no violations.
    pub fn fallback() -> Self {
        Self {
            overall_risk: RiskLevel::Low,
            score: 100.0,
            summary: "No anomalies detected.".to_string(),
            violations: Vec::new(),
        }
    }
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Extract full text and an ordered rule list from a raw document.
    /// Plain text is decoded and sent as text; other MIME types go as inline
    /// binary.
    async fn ingest_document(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<IngestedDocument, GatewayError>;

    /// Check policy text against current regulations via web-grounded
    /// retrieval. Unstructured response; citations come from grounding
    /// metadata.
    async fn verify_policy(&self, policy_text: &str) -> Result<VerificationReport, GatewayError>;

    /// Judge evidence against a policy's rules. Severity and overall risk are
    /// clamped to the defined levels during decode.
    async fn analyze_evidence(
        &self,
        rules: &[String],
        evidence: &EvidencePayload,
    ) -> Result<EvidenceAssessment, GatewayError>;

    /// Answer a question grounded strictly in the supplied policy context.
    /// `history` carries prior turns, synthetic greeting excluded.
    async fn converse(
        &self,
        history: &[ChatTurn],
        question: &str,
        policy: &Policy,
    ) -> Result<String, GatewayError>;

    fn info(&self) -> GatewayInfo;
}
