//! The orchestration façade consumed by the console view layer.
//!
//! Stateless: every operation runs a fixed sequence of storage-port and
//! gateway calls and returns the uniform `AgentResponse` envelope. Writes
//! that span two ports (train, analyze) are best-effort: a step that already
//! committed is not rolled back when a later step fails.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::gateway::{AiGateway, EvidenceAssessment};
use crate::monitor::SystemMonitor;
use crate::seed;
use crate::storage::{
    AnalyticsSink, EventLog, LocalStores, MetadataStore, ObjectStore, VectorIndexStore,
};
use crate::types::{
    AgentResponse, AnalysisResult, ChatTurn, EvidenceKind, EvidencePayload, IngestedDocument,
    Policy, ResponseMetadata, SessionContext, SystemHealth, VerificationReport,
};

/// Fixed advisory returned for queries against an untrained policy. A
/// precondition, not an error: the envelope is successful and carries this
/// text as its data.
pub const UNTRAINED_ADVISORY: &str = "This policy hasn't been trained yet.";

const MSG_INGEST_FAILED: &str = "Ingestion failed.";
const MSG_VERIFY_FAILED: &str = "Verification failed.";
const MSG_SAVE_FAILED: &str = "Metadata commit failed.";
const MSG_FETCH_FAILED: &str = "Fetch failed.";
const MSG_DEFAULTS_FAILED: &str = "Reference policy load failed.";
const MSG_ARCHIVE_FAILED: &str = "Delete failed.";
const MSG_ANALYZE_FAILED: &str = "Agent failed to analyze evidence.";
const MSG_NO_ACTIVE_POLICY: &str = "No active policy context.";
const MSG_TRAIN_FAILED: &str = "Training failed.";
const MSG_QUERY_FAILED: &str = "Error contacting the policy assistant.";
const MSG_BATCH_FAILED: &str = "Batch job failed.";

pub struct Orchestrator {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorIndexStore>,
    events: Arc<dyn EventLog>,
    analytics: Arc<dyn AnalyticsSink>,
    gateway: Arc<dyn AiGateway>,
    monitor: SystemMonitor,
}

impl Orchestrator {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorIndexStore>,
        events: Arc<dyn EventLog>,
        analytics: Arc<dyn AnalyticsSink>,
        gateway: Arc<dyn AiGateway>,
    ) -> Self {
        let monitor = SystemMonitor::new(
            objects.clone(),
            metadata.clone(),
            vectors.clone(),
            events.clone(),
            analytics.clone(),
        );
        Self {
            objects,
            metadata,
            vectors,
            events,
            analytics,
            gateway,
            monitor,
        }
    }

    /// Wire the façade onto an opened set of local ports.
    pub fn from_local(stores: &LocalStores, gateway: Arc<dyn AiGateway>) -> Self {
        Self::new(
            stores.objects.clone(),
            stores.metadata.clone(),
            stores.vectors.clone(),
            stores.events.clone(),
            stores.analytics.clone(),
            gateway,
        )
    }

    /// Upload a raw document, log the event, and extract text plus rules
    /// through the gateway. The resulting policy content is NOT persisted;
    /// the caller saves explicitly.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> AgentResponse<IngestedDocument> {
        let start = Instant::now();
        tracing::info!(filename, mime_type, size = bytes.len(), "ingest requested");
        match self.ingest_inner(bytes, mime_type, filename).await {
            Ok(doc) => AgentResponse::ok_with(doc, self.fast_meta(start)),
            Err(e) => failure("ingest", e, MSG_INGEST_FAILED),
        }
    }

    async fn ingest_inner(
        &self,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<IngestedDocument, EngineError> {
        if filename.trim().is_empty() {
            return Err(EngineError::Validation(
                "a document filename is required".into(),
            ));
        }
        self.objects
            .put(&format!("policies/{filename}"), bytes)
            .await?;
        self.events
            .append(&format!("Ingest Policy: {filename}"))
            .await?;
        Ok(self.gateway.ingest_document(bytes, mime_type).await?)
    }

    /// Check policy text against current regulations via web-grounded
    /// retrieval. No storage side effects.
    pub async fn verify(&self, policy_text: &str) -> AgentResponse<VerificationReport> {
        let start = Instant::now();
        match self.verify_inner(policy_text).await {
            Ok(report) => AgentResponse::ok_with(report, self.fast_meta(start)),
            Err(e) => failure("verify", e, MSG_VERIFY_FAILED),
        }
    }

    async fn verify_inner(&self, policy_text: &str) -> Result<VerificationReport, EngineError> {
        if policy_text.trim().is_empty() {
            return Err(EngineError::Validation("policy text is required".into()));
        }
        Ok(self.gateway.verify_policy(policy_text).await?)
    }

    /// Upsert a policy and log the event.
    pub async fn save(&self, policy: &Policy) -> AgentResponse<bool> {
        match self.save_inner(policy).await {
            Ok(()) => AgentResponse::ok(true),
            Err(e) => failure("save", e, MSG_SAVE_FAILED),
        }
    }

    async fn save_inner(&self, policy: &Policy) -> Result<(), EngineError> {
        if policy.id.trim().is_empty() {
            return Err(EngineError::Validation("a policy id is required".into()));
        }
        if policy.title.trim().is_empty() {
            return Err(EngineError::Validation("a policy title is required".into()));
        }
        self.metadata.save(policy).await?;
        self.events
            .append(&format!("Update Policy: {}", policy.id))
            .await?;
        Ok(())
    }

    pub async fn list(&self) -> AgentResponse<Vec<Policy>> {
        match self.metadata.get_all().await {
            Ok(policies) => AgentResponse::ok(policies),
            Err(e) => failure("list", e.into(), MSG_FETCH_FAILED),
        }
    }

    /// Install the bundled reference policies and mark each one indexed.
    pub async fn load_defaults(&self) -> AgentResponse<bool> {
        match seed::install(self.metadata.as_ref(), self.vectors.as_ref()).await {
            Ok(count) => AgentResponse::ok(true)
                .with_message(format!("{count} reference policies installed.")),
            Err(e) => failure("load_defaults", e.into(), MSG_DEFAULTS_FAILED),
        }
    }

    /// Remove a policy from the metadata store. Archiving an unknown id
    /// succeeds. Callers that held the policy as active context must clear it
    /// themselves.
    pub async fn archive(&self, id: &str) -> AgentResponse<bool> {
        match self.archive_inner(id).await {
            Ok(()) => AgentResponse::ok(true),
            Err(e) => failure("archive", e, MSG_ARCHIVE_FAILED),
        }
    }

    async fn archive_inner(&self, id: &str) -> Result<(), EngineError> {
        self.metadata.delete(id).await?;
        self.events.append(&format!("Delete Policy: {id}")).await?;
        Ok(())
    }

    /// Analyze evidence against the active policy's rules. Requires an active
    /// policy in context; fails fast without touching any port otherwise.
    pub async fn analyze(
        &self,
        context: &SessionContext,
        evidence: &EvidencePayload,
    ) -> AgentResponse<AnalysisResult> {
        let start = Instant::now();
        let Some(policy) = context.active_policy.as_ref() else {
            tracing::warn!(session_id = %context.session_id, "analysis rejected: no active policy");
            return AgentResponse::fail(MSG_NO_ACTIVE_POLICY);
        };
        match self.analyze_inner(policy, evidence).await {
            Ok(result) => AgentResponse::ok_with(result, self.fast_meta(start)),
            Err(e) => failure("analyze", e, MSG_ANALYZE_FAILED),
        }
    }

    async fn analyze_inner(
        &self,
        policy: &Policy,
        evidence: &EvidencePayload,
    ) -> Result<AnalysisResult, EngineError> {
        let key = match evidence.filename() {
            Some(name) => format!("evidence/{name}"),
            None => {
                let kind = match evidence.kind() {
                    EvidenceKind::Image => "image",
                    EvidenceKind::Log => "log",
                };
                format!("evidence/{}_{kind}.dat", Utc::now().timestamp_millis())
            }
        };
        self.objects.put(&key, evidence.as_bytes()).await?;

        let assessment = match self.gateway.analyze_evidence(&policy.rules, evidence).await {
            Ok(assessment) => assessment,
            Err(e) if e.is_decode() => {
                // Risk and score must be present even when the model payload
                // is unusable; substitute the documented defaults.
                tracing::warn!(error = %e, policy_id = %policy.id, "assessment payload unusable, applying defaults");
                EvidenceAssessment::fallback()
            }
            Err(e) => return Err(e.into()),
        };

        let result = AnalysisResult {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            evidence_name: evidence.display_name().to_string(),
            evidence_kind: evidence.kind(),
            overall_risk: assessment.overall_risk,
            score: assessment.score.clamp(0.0, 100.0),
            summary: assessment.summary,
            violations: assessment.violations,
        };
        self.analytics.insert(&result).await?;
        Ok(result)
    }

    /// Index policy content, then upsert the policy with `indexed = true`.
    /// Best-effort across the two ports: an index write that committed stays
    /// even if the metadata upsert fails.
    pub async fn train(&self, policy: &Policy) -> AgentResponse<Policy> {
        match self.train_inner(policy).await {
            Ok(trained) => {
                AgentResponse::ok(trained).with_message("Policy indexed into the vector store.")
            }
            Err(e) => failure("train", e, MSG_TRAIN_FAILED),
        }
    }

    async fn train_inner(&self, policy: &Policy) -> Result<Policy, EngineError> {
        if policy.id.trim().is_empty() {
            return Err(EngineError::Validation("a policy id is required".into()));
        }
        self.vectors
            .index_policy(&policy.id, &policy.content)
            .await?;
        let mut trained = policy.clone();
        trained.indexed = true;
        self.metadata.save(&trained).await?;
        Ok(trained)
    }

    /// Answer a question grounded in the active policy. Short-circuits with
    /// the fixed advisory, without a gateway call, unless the policy is
    /// indexed.
    pub async fn query(
        &self,
        history: &[ChatTurn],
        question: &str,
        context: &SessionContext,
    ) -> AgentResponse<String> {
        let start = Instant::now();
        let policy = match context.active_policy.as_ref() {
            Some(policy) if policy.indexed => policy,
            _ => return AgentResponse::ok(UNTRAINED_ADVISORY.to_string()),
        };
        if question.trim().is_empty() {
            return AgentResponse::fail("a question is required");
        }
        match self.gateway.converse(history, question, policy).await {
            Ok(answer) => AgentResponse::ok_with(answer, self.reasoning_meta(start)),
            Err(e) => failure("query", e.into(), MSG_QUERY_FAILED),
        }
    }

    /// Snapshot counts from every port.
    pub fn health(&self) -> AgentResponse<SystemHealth> {
        AgentResponse::ok(self.monitor.health())
    }

    /// All completed analyses, newest first.
    pub async fn audit_history(&self) -> AgentResponse<Vec<AnalysisResult>> {
        match self.analytics.query().await {
            Ok(rows) => AgentResponse::ok(rows),
            Err(e) => failure("audit_history", e.into(), MSG_FETCH_FAILED),
        }
    }

    /// Scheduled batch risk evaluation. The local build only records the run
    /// in the event log.
    pub async fn run_batch_job(&self) -> AgentResponse<bool> {
        tracing::info!("nightly risk evaluation batch triggered");
        match self.events.append("Batch Job Complete").await {
            Ok(()) => AgentResponse::ok(true),
            Err(e) => failure("run_batch_job", e.into(), MSG_BATCH_FAILED),
        }
    }

    fn fast_meta(&self, start: Instant) -> ResponseMetadata {
        ResponseMetadata {
            model: self.gateway.info().fast_model,
            tokens_used: None,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }
    }

    fn reasoning_meta(&self, start: Instant) -> ResponseMetadata {
        ResponseMetadata {
            model: self.gateway.info().reasoning_model,
            tokens_used: None,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}

/// Map an engine error to the envelope: validation and precondition problems
/// surface their own text, everything else the operation's fixed message.
fn failure<T>(operation: &str, err: EngineError, fixed: &str) -> AgentResponse<T> {
    match err {
        EngineError::Validation(msg) | EngineError::Precondition(msg) => {
            tracing::warn!(operation, reason = %msg, "operation rejected");
            AgentResponse::fail(msg)
        }
        other => {
            tracing::error!(operation, error = %other, "operation failed");
            AgentResponse::fail(fixed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::GatewayInfo;
    use crate::types::{RiskLevel, SourceCitation, Violation};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockGateway {
        calls: AtomicUsize,
        malformed_assessment: bool,
    }

    impl MockGateway {
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiGateway for MockGateway {
        async fn ingest_document(
            &self,
            bytes: &[u8],
            _mime_type: &str,
        ) -> Result<IngestedDocument, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = String::from_utf8_lossy(bytes).to_string();
            Ok(IngestedDocument {
                text: text.clone(),
                rules: vec![text],
            })
        }

        async fn verify_policy(
            &self,
            _policy_text: &str,
        ) -> Result<VerificationReport, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VerificationReport {
                summary: "Policy aligns with current regulations.".into(),
                sources: vec![SourceCitation {
                    title: "OSHA 1926.501".into(),
                    uri: "https://example.com/osha".into(),
                }],
            })
        }

        async fn analyze_evidence(
            &self,
            _rules: &[String],
            _evidence: &EvidencePayload,
        ) -> Result<EvidenceAssessment, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.malformed_assessment {
                return Err(GatewayError::Decode {
                    reason: "payload was prose, not JSON".into(),
                });
            }
            Ok(EvidenceAssessment {
                overall_risk: RiskLevel::High,
                // Out of range on purpose: the orchestrator must clamp.
                score: 150.0,
                summary: "Worker without hard hat in Zone A.".into(),
                violations: vec![Violation {
                    description: "Missing hard hat".into(),
                    severity: RiskLevel::High,
                    recommendation: "Stop work until PPE is worn.".into(),
                }],
            })
        }

        async fn converse(
            &self,
            _history: &[ChatTurn],
            _question: &str,
            policy: &Policy,
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Grounded answer about {}", policy.title))
        }

        fn info(&self) -> GatewayInfo {
            GatewayInfo {
                fast_model: "mock-fast".into(),
                reasoning_model: "mock-reasoning".into(),
            }
        }
    }

    async fn setup(
        malformed: bool,
    ) -> (
        tempfile::TempDir,
        LocalStores,
        Arc<MockGateway>,
        Orchestrator,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let stores = LocalStores::open(dir.path()).await.unwrap();
        let gateway = Arc::new(MockGateway {
            calls: AtomicUsize::new(0),
            malformed_assessment: malformed,
        });
        let orchestrator = Orchestrator::from_local(&stores, gateway.clone());
        (dir, stores, gateway, orchestrator)
    }

    fn trained_policy() -> Policy {
        let mut policy = Policy::new("p1", "Dock Safety");
        policy.content = "Wheel chocks mandatory.".into();
        policy.rules = vec!["Wheel chocks mandatory.".into()];
        policy.indexed = true;
        policy
    }

    #[tokio::test]
    async fn ingest_extracts_text_and_rules_without_persisting_a_policy() {
        let (_dir, stores, _gateway, orchestrator) = setup(false).await;

        let response = orchestrator
            .ingest(b"Wear a hard hat.", "text/plain", "rules.txt")
            .await;

        assert!(response.success);
        let doc = response.data.unwrap();
        assert_eq!(doc.text, "Wear a hard hat.");
        assert_eq!(doc.rules.len(), 1);
        assert_eq!(response.metadata.unwrap().model, "mock-fast");

        assert_eq!(stores.objects.object_count(), 1);
        assert_eq!(stores.events.row_count(), 1);
        // Ingest never writes the policy itself.
        assert_eq!(stores.metadata.row_count(), 0);
    }

    #[tokio::test]
    async fn ingest_requires_a_filename() {
        let (_dir, stores, gateway, orchestrator) = setup(false).await;

        let response = orchestrator.ingest(b"text", "text/plain", "  ").await;
        assert!(!response.success);
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(stores.objects.object_count(), 0);
    }

    #[tokio::test]
    async fn save_then_list_is_an_idempotent_upsert() {
        let (_dir, _stores, _gateway, orchestrator) = setup(false).await;

        let mut policy = Policy::new("p1", "T");
        assert!(orchestrator.save(&policy).await.success);

        let listed = orchestrator.list().await.data.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "p1");
        assert_eq!(listed[0].title, "T");
        assert!(listed[0].rules.is_empty());

        policy.title = "T2".into();
        assert!(orchestrator.save(&policy).await.success);

        let listed = orchestrator.list().await.data.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "T2");
    }

    #[tokio::test]
    async fn save_rejects_missing_title_before_any_write() {
        let (_dir, stores, _gateway, orchestrator) = setup(false).await;

        let policy = Policy::new("p1", "");
        let response = orchestrator.save(&policy).await;

        assert!(!response.success);
        assert_eq!(stores.metadata.row_count(), 0);
        assert_eq!(stores.events.row_count(), 0);
    }

    #[tokio::test]
    async fn analyze_without_active_policy_touches_nothing() {
        let (_dir, stores, gateway, orchestrator) = setup(false).await;

        let context = SessionContext {
            session_id: "s1".into(),
            active_policy: None,
        };
        let evidence = EvidencePayload::Log {
            text: "temp log".into(),
            filename: None,
        };
        let response = orchestrator.analyze(&context, &evidence).await;

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("No active policy context."));
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(stores.objects.object_count(), 0);
        assert_eq!(stores.analytics.row_count(), 0);
    }

    #[tokio::test]
    async fn analyze_stores_evidence_and_streams_the_result() {
        let (_dir, stores, _gateway, orchestrator) = setup(false).await;

        let context = SessionContext::with_policy("s1", trained_policy());
        let evidence = EvidencePayload::Image {
            bytes: vec![0xFF, 0xD8],
            filename: Some("cam1.jpg".into()),
        };
        let response = orchestrator.analyze(&context, &evidence).await;

        assert!(response.success);
        let result = response.data.unwrap();
        assert_eq!(result.overall_risk, RiskLevel::High);
        assert_eq!(result.score, 100.0); // clamped from 150
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.evidence_kind, EvidenceKind::Image);

        assert_eq!(stores.objects.object_count(), 1);
        assert_eq!(stores.analytics.row_count(), 1);

        let history = orchestrator.audit_history().await.data.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, result.id);
    }

    #[tokio::test]
    async fn malformed_assessment_falls_back_to_defaults() {
        let (_dir, stores, _gateway, orchestrator) = setup(true).await;

        let context = SessionContext::with_policy("s1", trained_policy());
        let evidence = EvidencePayload::Log {
            text: "freezer at -5C".into(),
            filename: None,
        };
        let response = orchestrator.analyze(&context, &evidence).await;

        assert!(response.success);
        let result = response.data.unwrap();
        assert_eq!(result.overall_risk, RiskLevel::Low);
        assert_eq!(result.score, 100.0);
        assert!(result.violations.is_empty());
        assert_eq!(stores.analytics.row_count(), 1);
    }

    #[tokio::test]
    async fn query_before_training_returns_the_advisory_without_a_gateway_call() {
        let (_dir, _stores, gateway, orchestrator) = setup(false).await;

        let mut policy = trained_policy();
        policy.indexed = false;
        let context = SessionContext::with_policy("s1", policy);

        let response = orchestrator.query(&[], "Are chocks required?", &context).await;
        assert!(response.success);
        assert_eq!(response.data.as_deref(), Some(UNTRAINED_ADVISORY));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn train_marks_indexed_and_unlocks_queries() {
        let (_dir, stores, gateway, orchestrator) = setup(false).await;

        let mut policy = trained_policy();
        policy.indexed = false;
        orchestrator.save(&policy).await;

        let trained = orchestrator.train(&policy).await.data.unwrap();
        assert!(trained.indexed);
        assert!(stores.vectors.is_indexed("p1"));

        let listed = orchestrator.list().await.data.unwrap();
        assert!(listed.iter().find(|p| p.id == "p1").unwrap().indexed);

        let context = SessionContext::with_policy("s1", trained);
        let response = orchestrator.query(&[], "Are chocks required?", &context).await;
        assert!(response.success);
        assert!(response.data.unwrap().contains("Dock Safety"));
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(response.message, None);
    }

    #[tokio::test]
    async fn archive_removes_the_policy_and_tolerates_unknown_ids() {
        let (_dir, _stores, _gateway, orchestrator) = setup(false).await;

        orchestrator.save(&Policy::new("p1", "T")).await;
        assert!(orchestrator.archive("p1").await.success);
        assert!(orchestrator.list().await.data.unwrap().is_empty());

        // Archiving an id that never existed still succeeds.
        assert!(orchestrator.archive("ghost").await.success);
    }

    #[tokio::test]
    async fn load_defaults_installs_and_indexes_the_reference_set() {
        let (_dir, stores, _gateway, orchestrator) = setup(false).await;

        let response = orchestrator.load_defaults().await;
        assert!(response.success);

        let listed = orchestrator.list().await.data.unwrap();
        assert_eq!(listed.len(), 8);
        assert!(stores.vectors.is_indexed("pol-mfg-001"));

        let health = orchestrator.health().data.unwrap();
        assert_eq!(health.storage.metadata_rows, 8);
        assert_eq!(health.storage.vector_count, 8);
    }

    #[tokio::test]
    async fn verify_rejects_empty_text_without_a_gateway_call() {
        let (_dir, _stores, gateway, orchestrator) = setup(false).await;

        let response = orchestrator.verify("   ").await;
        assert!(!response.success);
        assert_eq!(gateway.call_count(), 0);

        let response = orchestrator.verify("All staff wear helmets.").await;
        assert!(response.success);
        assert_eq!(response.data.unwrap().sources.len(), 1);
    }

    #[tokio::test]
    async fn batch_job_appends_an_event_row() {
        let (_dir, stores, _gateway, orchestrator) = setup(false).await;

        assert!(orchestrator.run_batch_job().await.success);
        assert_eq!(stores.events.row_count(), 1);
    }
}
