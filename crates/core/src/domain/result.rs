use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::phase::Phase;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of running one planned task. Always tagged with the originating
/// task name, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub attempts: u32,
}

impl TaskResult {
    pub fn succeeded(
        task_name: impl Into<String>,
        payload: impl Into<String>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            status: TaskStatus::Succeeded,
            payload: Some(payload.into()),
            error: None,
            duration_ms,
            attempts,
        }
    }

    pub fn failed(
        task_name: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            status: TaskStatus::Failed,
            payload: None,
            error: Some(error.into()),
            duration_ms,
            attempts,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Complete,
    Degraded,
    Fatal,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Degraded => "degraded",
            Self::Fatal => "fatal",
        }
    }
}

/// Outcome of one phase. Immutable once produced; the context only hands
/// these out by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub status: PhaseStatus,
    /// Raw findings. Empty for degraded phases; for the dynamic phase, a
    /// digest of the succeeded tasks' payloads.
    pub payload: String,
    /// Per-task outcomes. Empty for sequential phases.
    pub task_results: Vec<TaskResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl PhaseResult {
    pub fn complete(phase: Phase, payload: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            phase,
            status: PhaseStatus::Complete,
            payload: payload.into(),
            task_results: Vec::new(),
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// An exhausted optional phase: no findings, run continues.
    pub fn degraded(phase: Phase, started_at: DateTime<Utc>) -> Self {
        Self {
            phase,
            status: PhaseStatus::Degraded,
            payload: String::new(),
            task_results: Vec::new(),
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Aggregate the dynamic phase's task results into one phase result.
    ///
    /// All tasks succeeded: Complete. Some failed: Degraded. Every task
    /// failed: Fatal, which the sequencer treats like a required-phase
    /// exhaustion.
    pub fn from_tasks(
        phase: Phase,
        task_results: Vec<TaskResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let failed = task_results.iter().filter(|r| r.is_failed()).count();
        let status = if failed == 0 {
            PhaseStatus::Complete
        } else if failed == task_results.len() {
            PhaseStatus::Fatal
        } else {
            PhaseStatus::Degraded
        };

        let payload = task_results
            .iter()
            .filter_map(|result| {
                result
                    .payload
                    .as_deref()
                    .map(|text| format!("### {}\n\n{}", result.task_name, text))
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            phase,
            status,
            payload,
            task_results,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn ordinal(&self) -> u8 {
        self.phase.ordinal()
    }

    pub fn failed_task_names(&self) -> Vec<&str> {
        self.task_results
            .iter()
            .filter(|result| result.is_failed())
            .map(|result| result.task_name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Degraded,
    Fatal,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Degraded => "degraded",
            Self::Fatal => "fatal",
        }
    }
}

/// Final product of a run: every phase result in order, plus what went
/// wrong along the way. Returned even when the run aborts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub results: Vec<PhaseResult>,
    /// Degraded phases and failed tasks, in the order they were observed.
    pub warnings: Vec<String>,
    /// Present only on a fatal abort: which phase ended the run and why.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
