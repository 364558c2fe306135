use std::fmt;

use surveyor_core::Phase;

use crate::error::{PipelineError, Result};

/// Where a run currently sits. `Running` carries the ordinal of the phase
/// being executed, so the flow rules can enforce forward-only movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(u8),
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Running(ordinal) => write!(f, "running({ordinal})"),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Transition rules for a run. Phases only advance by one ordinal at a
/// time, nothing re-enters an earlier phase, and an abort is terminal.
pub struct PhaseFlow;

impl PhaseFlow {
    pub fn can_transition(from: &RunState, to: &RunState) -> bool {
        use RunState::*;
        match (from, to) {
            (Pending, Running(ordinal)) => *ordinal == first_ordinal(),
            (Running(current), Running(next)) => *next == current + 1,
            (Running(current), Completed) => *current == last_ordinal(),
            (Pending, Aborted) | (Running(_), Aborted) => true,
            _ => false,
        }
    }

    pub fn validate_transition(from: &RunState, to: &RunState) -> Result<()> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

fn first_ordinal() -> u8 {
    Phase::SEQUENCE.first().map(Phase::ordinal).unwrap_or(1)
}

fn last_ordinal() -> u8 {
    Phase::SEQUENCE.last().map(Phase::ordinal).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(PhaseFlow::can_transition(
            &RunState::Pending,
            &RunState::Running(1)
        ));
        assert!(PhaseFlow::can_transition(
            &RunState::Running(1),
            &RunState::Running(2)
        ));
        assert!(PhaseFlow::can_transition(
            &RunState::Running(last_ordinal()),
            &RunState::Completed
        ));
        assert!(PhaseFlow::can_transition(
            &RunState::Pending,
            &RunState::Aborted
        ));
        assert!(PhaseFlow::can_transition(
            &RunState::Running(3),
            &RunState::Aborted
        ));
    }

    #[test]
    fn test_invalid_transitions() {
        // No skipping ahead.
        assert!(!PhaseFlow::can_transition(
            &RunState::Running(1),
            &RunState::Running(3)
        ));
        // No re-entering an earlier phase.
        assert!(!PhaseFlow::can_transition(
            &RunState::Running(4),
            &RunState::Running(3)
        ));
        // No finishing mid-sequence.
        assert!(!PhaseFlow::can_transition(
            &RunState::Running(2),
            &RunState::Completed
        ));
        // Terminal states stay terminal.
        assert!(!PhaseFlow::can_transition(
            &RunState::Completed,
            &RunState::Running(1)
        ));
        assert!(!PhaseFlow::can_transition(
            &RunState::Aborted,
            &RunState::Running(1)
        ));
        assert!(!PhaseFlow::can_transition(
            &RunState::Completed,
            &RunState::Aborted
        ));
    }

    #[test]
    fn test_run_must_start_at_first_phase() {
        assert!(!PhaseFlow::can_transition(
            &RunState::Pending,
            &RunState::Running(2)
        ));
    }

    #[test]
    fn test_validate_transition_error_names_both_states() {
        let err = PhaseFlow::validate_transition(&RunState::Running(5), &RunState::Running(2))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("running(5)"));
        assert!(message.contains("running(2)"));
    }

    #[test]
    fn test_display() {
        assert_eq!(RunState::Pending.to_string(), "pending");
        assert_eq!(RunState::Running(4).to_string(), "running(4)");
        assert_eq!(RunState::Completed.to_string(), "completed");
        assert_eq!(RunState::Aborted.to_string(), "aborted");
    }
}
