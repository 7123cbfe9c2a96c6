//! Analytics sink for completed analyses, newest first.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::AnalyticsSink;
use crate::types::AnalysisResult;

const SINK_FILE: &str = "analytics.json";

pub struct LocalAnalyticsSink {
    path: PathBuf,
    rows: RwLock<Vec<AnalysisResult>>,
}

impl LocalAnalyticsSink {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SINK_FILE),
            rows: RwLock::new(Vec::new()),
        }
    }

    fn persist(&self, rows: &[AnalysisResult]) -> Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for LocalAnalyticsSink {
    async fn open(&self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let rows: Vec<AnalysisResult> =
                serde_json::from_str(&content).context("Failed to parse analytics rows")?;
            *self.rows.write() = rows;
        }
        Ok(())
    }

    async fn insert(&self, result: &AnalysisResult) -> Result<()> {
        let mut rows = self.rows.write();
        rows.insert(0, result.clone());
        self.persist(&rows)?;
        tracing::info!(
            analysis_id = %result.id,
            risk = %result.overall_risk.as_str(),
            score = result.score,
            "analysis row streamed to sink"
        );
        Ok(())
    }

    async fn query(&self) -> Result<Vec<AnalysisResult>> {
        Ok(self.rows.read().clone())
    }

    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    async fn close(&self) -> Result<()> {
        let rows = self.rows.read();
        self.persist(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvidenceKind, RiskLevel};
    use chrono::Utc;

    fn result(id: &str) -> AnalysisResult {
        AnalysisResult {
            id: id.to_string(),
            timestamp: Utc::now(),
            evidence_name: "Log/Text Evidence".into(),
            evidence_kind: EvidenceKind::Log,
            overall_risk: RiskLevel::Low,
            score: 100.0,
            summary: "No anomalies detected.".into(),
            violations: Vec::new(),
        }
    }

    #[tokio::test]
    async fn newest_row_comes_back_first() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalAnalyticsSink::new(dir.path());
        sink.open().await.unwrap();

        sink.insert(&result("a")).await.unwrap();
        sink.insert(&result("b")).await.unwrap();

        let rows = sink.query().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[1].id, "a");
    }
}
