use surveyor_core::{CoreError, Phase};
use thiserror::Error;

use crate::backend::ReasoningError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Phase {phase:?} failed after {attempts} attempts: {reason}")]
    PhaseFailed {
        phase: Phase,
        attempts: u32,
        reason: String,
    },

    #[error("Every task in phase {phase:?} failed")]
    AllTasksFailed { phase: Phase },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Backend error: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PipelineError {
    /// Create a phase failure error.
    pub fn phase_failed(phase: Phase, attempts: u32, reason: impl Into<String>) -> Self {
        Self::PhaseFailed {
            phase,
            attempts,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PipelineError::phase_failed(Phase::Report, 3, "backend rejected request");
        let text = error.to_string();
        assert!(text.contains("Report"));
        assert!(text.contains('3'));
        assert!(text.contains("backend rejected request"));

        let error = PipelineError::AllTasksFailed {
            phase: Phase::Analysis,
        };
        assert!(error.to_string().contains("Analysis"));
    }
}
