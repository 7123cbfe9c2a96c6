//! Response schemas declared to the model and the decode step that validates
//! what comes back. Decoding returns typed errors for non-JSON payloads;
//! fields that are merely absent fall back to documented defaults.

use serde::Deserialize;
use serde_json::{json, Value};

use super::EvidenceAssessment;
use crate::error::GatewayError;
use crate::types::{IngestedDocument, RiskLevel, Violation};

const RISK_LABELS: [&str; 4] = ["LOW", "MEDIUM", "HIGH", "CRITICAL"];

/// Schema for the ingestion call: extracted text plus an ordered rule list.
pub fn ingestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "textContent": { "type": "STRING" },
            "rules": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

/// Schema for the evidence-analysis call.
pub fn assessment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallRisk": { "type": "STRING", "enum": RISK_LABELS },
            "score": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "violations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": RISK_LABELS },
                        "recommendation": { "type": "STRING" }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngestion {
    #[serde(default)]
    text_content: Option<String>,
    #[serde(default)]
    rules: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    #[serde(default)]
    overall_risk: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    violations: Option<Vec<RawViolation>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViolation {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    recommendation: Option<String>,
}

pub fn decode_ingestion(text: &str) -> Result<IngestedDocument, GatewayError> {
    let raw: RawIngestion = serde_json::from_str(text).map_err(|e| GatewayError::Decode {
        reason: format!("ingestion payload is not valid JSON: {e}"),
    })?;

    Ok(IngestedDocument {
        text: raw
            .text_content
            .unwrap_or_else(|| "No text extracted.".to_string()),
        rules: raw.rules.unwrap_or_default(),
    })
}

pub fn decode_assessment(text: &str) -> Result<EvidenceAssessment, GatewayError> {
    let raw: RawAssessment = serde_json::from_str(text).map_err(|e| GatewayError::Decode {
        reason: format!("assessment payload is not valid JSON: {e}"),
    })?;

    let violations = raw
        .violations
        .unwrap_or_default()
        .into_iter()
        .map(|v| Violation {
            description: v.description.unwrap_or_default(),
            severity: v
                .severity
                .as_deref()
                .map(RiskLevel::from_label)
                .unwrap_or_default(),
            recommendation: v.recommendation.unwrap_or_default(),
        })
        .collect();

    Ok(EvidenceAssessment {
        overall_risk: raw
            .overall_risk
            .as_deref()
            .map(RiskLevel::from_label)
            .unwrap_or_default(),
        score: raw.score.unwrap_or(100.0).clamp(0.0, 100.0),
        summary: raw
            .summary
            .unwrap_or_else(|| "No anomalies detected.".to_string()),
        violations,
    })
}
