//! The reasoning backend boundary.
//!
//! The engine drives everything through [`ReasoningService`] and never sees
//! the backend's identity or wire protocol. Errors are classified here, at
//! the boundary: callers only ever ask [`ReasoningError::is_transient`]
//! before deciding whether to retry.

use std::time::Duration;

use async_trait::async_trait;
use surveyor_core::{ModelProfile, Phase};
use thiserror::Error;

/// One reasoning call: which phase is asking, under what role, with the
/// accumulated context so far.
#[derive(Debug, Clone)]
pub struct ReasoningRequest<'a> {
    pub phase: Phase,
    /// Short role tag for the caller (a phase role or a task name).
    pub role: &'a str,
    /// Full instructions for this call.
    pub instructions: &'a str,
    /// Immutable digest of every prior phase's findings.
    pub context_snapshot: &'a str,
    pub profile: &'a ModelProfile,
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Call timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Rate limited by backend")]
    RateLimited { retry_after: Option<u64> },

    #[error("Backend API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Backend rejected request: {0}")]
    InvalidRequest(String),

    #[error("Backend returned no content")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ReasoningError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, rate limits, transport failures, and server-side errors
    /// are transient. Rejected requests, auth failures, and empty payloads
    /// will not get better on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status_code, .. } => matches!(status_code, Some(code) if *code >= 500),
            Self::Auth(_) | Self::InvalidRequest(_) | Self::EmptyResponse => false,
        }
    }
}

/// The narrow contract the engine holds on the reasoning backend.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn invoke(&self, request: ReasoningRequest<'_>) -> Result<String, ReasoningError>;
}

/// Invoke the service under a hard per-call deadline, mapping expiry to a
/// transient timeout error.
pub async fn invoke_with_timeout(
    service: &dyn ReasoningService,
    deadline: Duration,
    request: ReasoningRequest<'_>,
) -> Result<String, ReasoningError> {
    match tokio::time::timeout(deadline, service.invoke(request)).await {
        Ok(result) => result,
        Err(_) => Err(ReasoningError::Timeout {
            duration_ms: deadline.as_millis() as u64,
        }),
    }
}
