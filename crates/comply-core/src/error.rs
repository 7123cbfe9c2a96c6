use thiserror::Error;

/// Failures from the AI gateway. Malformed model output is its own kind so
/// callers can tell a decode problem from a transport problem.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned an empty response")]
    Empty,

    #[error("model output could not be decoded: {reason}")]
    Decode { reason: String },

    #[error("request blocked by safety filter: {reason}")]
    SafetyBlocked { reason: String },
}

impl GatewayError {
    /// True when the transport succeeded but the payload itself was unusable.
    /// Evidence analysis substitutes documented defaults for these; every
    /// other operation treats them as a remote failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Empty)
    }
}

/// Engine-level error taxonomy: input validation, precondition, storage, and
/// remote-call failures. Validation and precondition errors are raised before
/// any port or gateway call is attempted.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("precondition not met: {0}")]
    Precondition(String),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_kinds_are_distinguishable() {
        assert!(GatewayError::Empty.is_decode());
        assert!(GatewayError::Decode {
            reason: "not json".into()
        }
        .is_decode());
        assert!(!GatewayError::Status {
            status: 500,
            body: "boom".into()
        }
        .is_decode());
    }

    #[test]
    fn gateway_errors_convert_into_engine_errors() {
        let err: EngineError = GatewayError::Empty.into();
        assert!(matches!(err, EngineError::Gateway(GatewayError::Empty)));
    }
}
