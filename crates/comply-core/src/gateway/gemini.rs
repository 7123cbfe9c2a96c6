//! Gemini-backed gateway implementation over the generateContent REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

use super::{schema, AiGateway, EvidenceAssessment, GatewayInfo};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{
    ChatRole, ChatTurn, EvidencePayload, IngestedDocument, Policy, SourceCitation,
    VerificationReport,
};

pub struct GeminiGateway {
    client: reqwest::Client,
    endpoint: String,
    fast_model: String,
    reasoning_model: String,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .context("no API key configured; set gateway.api_key or GEMINI_API_KEY")?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            fast_model: config.fast_model.clone(),
            reasoning_model: config.reasoning_model.clone(),
            api_key,
        })
    }

    /// One generateContent exchange. Returns the parsed response body after
    /// transport, HTML-page, and safety-filter checks.
    async fn generate(&self, model: &str, body: Value) -> Result<Value, GatewayError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        tracing::debug!(model = %model, "dispatching generateContent request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: preview(&text),
            });
        }

        // CDNs and proxies sometimes return 200 with an HTML error page.
        let trimmed = text.trim_start();
        if trimmed.starts_with('<') {
            return Err(GatewayError::Decode {
                reason: format!("endpoint returned HTML instead of JSON: {}", preview(&text)),
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| GatewayError::Decode {
            reason: format!("response body is not valid JSON: {e}"),
        })?;

        if let Some(reason) = value["promptFeedback"]["blockReason"].as_str() {
            return Err(GatewayError::SafetyBlocked {
                reason: reason.to_string(),
            });
        }

        Ok(value)
    }

    /// Concatenated text of the first candidate's parts.
    fn response_text(value: &Value) -> Result<String, GatewayError> {
        let parts = value["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(GatewayError::Empty);
        }
        Ok(text)
    }

    fn grounding_sources(value: &Value) -> Vec<SourceCitation> {
        value["candidates"][0]["groundingMetadata"]["groundingChunks"]
            .as_array()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|c| {
                        let web = c.get("web")?;
                        Some(SourceCitation {
                            title: web["title"].as_str()?.to_string(),
                            uri: web["uri"].as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn ingest_document(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<IngestedDocument, GatewayError> {
        let body = ingest_request_body(bytes, mime_type);
        let response = self.generate(&self.fast_model, body).await?;
        let text = Self::response_text(&response)?;
        schema::decode_ingestion(&text)
    }

    async fn verify_policy(&self, policy_text: &str) -> Result<VerificationReport, GatewayError> {
        let body = verify_request_body(policy_text);
        let response = self.generate(&self.fast_model, body).await?;

        let summary = match Self::response_text(&response) {
            Ok(text) => text,
            Err(GatewayError::Empty) => "No verification insights found.".to_string(),
            Err(e) => return Err(e),
        };

        Ok(VerificationReport {
            summary,
            sources: Self::grounding_sources(&response),
        })
    }

    async fn analyze_evidence(
        &self,
        rules: &[String],
        evidence: &EvidencePayload,
    ) -> Result<EvidenceAssessment, GatewayError> {
        let body = analyze_request_body(rules, evidence);
        let response = self.generate(&self.fast_model, body).await?;
        let text = Self::response_text(&response)?;
        schema::decode_assessment(&text)
    }

    async fn converse(
        &self,
        history: &[ChatTurn],
        question: &str,
        policy: &Policy,
    ) -> Result<String, GatewayError> {
        let body = converse_request_body(history, question, policy);
        let response = self.generate(&self.reasoning_model, body).await?;
        Self::response_text(&response)
    }

    fn info(&self) -> GatewayInfo {
        GatewayInfo {
            fast_model: self.fast_model.clone(),
            reasoning_model: self.reasoning_model.clone(),
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(300).collect()
}

fn safety_settings() -> Value {
    json!([{
        "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
        "threshold": "BLOCK_MEDIUM_AND_ABOVE"
    }])
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

/// Request for document ingestion. Plain text rides as a text part; anything
/// else is inlined as base64 binary.
fn ingest_request_body(bytes: &[u8], mime_type: &str) -> Value {
    let mut parts = Vec::new();
    if mime_type == "text/plain" {
        let text = String::from_utf8_lossy(bytes);
        parts.push(json!({ "text": format!("DOCUMENT CONTENT:\n{text}") }));
    } else {
        parts.push(json!({
            "inlineData": { "mimeType": mime_type, "data": BASE64.encode(bytes) }
        }));
    }
    parts.push(json!({
        "text": "You are a policy ingestion agent. Read this document. \
                 1. Extract the full text content accurately. \
                 2. Extract a list of key compliance rules. Return as JSON."
    }));

    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema::ingestion_schema()
        },
        "safetySettings": safety_settings()
    })
}

/// Request for web-grounded verification. No response schema: the grounding
/// tool is mutually exclusive with structured-output mode.
fn verify_request_body(policy_text: &str) -> Value {
    let prompt = format!(
        "Verify this policy content against current regulations (like OSHA, HIPAA, GDPR, etc.) \
         and general industry standards. Point out outdated rules or suggest missing compliance \
         requirements.\n\nPolicy Content:\n{policy_text}"
    );

    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "tools": [{ "googleSearch": {} }]
    })
}

fn analyze_request_body(rules: &[String], evidence: &EvidencePayload) -> Value {
    let mut prompt =
        String::from("Role: compliance officer agent.\nTask: Analyze evidence against policy rules.\n\nPolicy Rules:\n");
    for (i, rule) in rules.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }

    let mut parts = vec![json!({ "text": prompt })];
    match evidence {
        EvidencePayload::Image { bytes, .. } => {
            parts.push(json!({
                "inlineData": { "mimeType": "image/jpeg", "data": BASE64.encode(bytes) }
            }));
            parts.push(json!({
                "text": "Detect safety violations in this image based strictly on the rules above."
            }));
        }
        EvidencePayload::Log { text, .. } => {
            parts.push(json!({
                "text": format!(
                    "Analyze the following LOG DATA for violations:\n\n{text}\n\n\
                     Check dates, values, and procedures against the rules."
                )
            }));
        }
    }

    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema::assessment_schema()
        },
        "safetySettings": safety_settings()
    })
}

fn converse_request_body(history: &[ChatTurn], question: &str, policy: &Policy) -> Value {
    let industry = policy
        .industry
        .map(|i| format!("{i:?}"))
        .unwrap_or_else(|| "General".to_string());

    let system_instruction = format!(
        "You are a specialized compliance assistant.\n\
         Use the provided policy context to answer the user's question.\n\
         Active Policy: \"{}\"\n\
         Industry: {}\n\
         Content: {}\n\
         Rules: {}\n\
         Answer strictly based on the context.",
        policy.title,
        industry,
        policy.content,
        policy.rules.join("\n")
    );

    let mut contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            json!({
                "role": role_label(turn.role),
                "parts": [{ "text": turn.text }]
            })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": question }] }));

    json!({
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
        "contents": contents
    })
}
