use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the generative-model API.
    pub endpoint: String,
    /// Model used for ingestion, verification, and evidence analysis.
    pub fast_model: String,
    /// Model used for conversational queries.
    pub reasoning_model: String,
    /// API key; falls back to the GEMINI_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}

impl EngineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.gateway.endpoint.trim().is_empty() {
            return Err("gateway.endpoint must not be empty".into());
        }
        if self.gateway.fast_model.trim().is_empty() {
            return Err("gateway.fast_model must not be empty".into());
        }
        if self.gateway.reasoning_model.trim().is_empty() {
            return Err("gateway.reasoning_model must not be empty".into());
        }
        if self.gateway.connect_timeout_secs == 0 {
            return Err("gateway.connect_timeout_secs must be > 0".into());
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err("gateway.request_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("comply-core");

        Self {
            data_dir,
            gateway: GatewayConfig {
                endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                fast_model: "gemini-2.5-flash".to_string(),
                reasoning_model: "gemini-3-pro-preview".to_string(),
                api_key: None,
                connect_timeout_secs: 15,
                request_timeout_secs: 300,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_model_name_is_rejected() {
        let mut config = EngineConfig::default();
        config.gateway.fast_model = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_api_key_wins_over_env() {
        let mut config = EngineConfig::default();
        config.gateway.api_key = Some("from-config".into());
        assert_eq!(
            config.gateway.resolve_api_key().as_deref(),
            Some("from-config")
        );
    }
}
