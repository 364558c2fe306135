//! Event types emitted while a pipeline run progresses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// The run this event belongs to
    pub run_id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new envelope with auto-generated ID and timestamp
    pub fn new(run_id: Uuid, event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All progress events a run can emit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run began over the scanned project
    #[serde(rename = "run.started")]
    RunStarted { project: String, file_count: usize },

    /// A phase began executing
    #[serde(rename = "phase.started")]
    PhaseStarted { phase: String, ordinal: u8 },

    /// A phase finished with the given status
    #[serde(rename = "phase.completed")]
    PhaseCompleted {
        phase: String,
        ordinal: u8,
        status: String,
    },

    /// The dynamic phase resolved its task set
    #[serde(rename = "plan.resolved")]
    PlanResolved { source: String, task_count: usize },

    /// A planned task began executing
    #[serde(rename = "task.started")]
    TaskStarted { task_name: String },

    /// A planned task finished with the given status
    #[serde(rename = "task.completed")]
    TaskCompleted {
        task_name: String,
        status: String,
        attempts: u32,
    },

    /// The run finished
    #[serde(rename = "run.completed")]
    RunCompleted {
        status: String,
        warning_count: usize,
    },
}

impl Event {
    /// Dotted event name, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::PhaseStarted { .. } => "phase.started",
            Self::PhaseCompleted { .. } => "phase.completed",
            Self::PlanResolved { .. } => "plan.resolved",
            Self::TaskStarted { .. } => "task.started",
            Self::TaskCompleted { .. } => "task.completed",
            Self::RunCompleted { .. } => "run.completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_uses_dotted_tag() {
        let event = Event::PhaseStarted {
            phase: "discovery".to_string(),
            ordinal: 1,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"phase.started""#));
        assert!(json.contains(r#""phase":"discovery""#));
    }

    #[test]
    fn test_event_round_trip() {
        let event = Event::TaskCompleted {
            task_name: "Structure Survey".to_string(),
            status: "succeeded".to_string(),
            attempts: 2,
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();

        match back {
            Event::TaskCompleted {
                task_name,
                status,
                attempts,
            } => {
                assert_eq!(task_name, "Structure Survey");
                assert_eq!(status, "succeeded");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_envelope_carries_run_id() {
        let run_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(
            run_id,
            Event::RunCompleted {
                status: "complete".to_string(),
                warning_count: 0,
            },
        );

        assert_eq!(envelope.run_id, run_id);
        assert_eq!(envelope.event.kind(), "run.completed");
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let events = [
            Event::RunStarted {
                project: "demo".to_string(),
                file_count: 3,
            },
            Event::PlanResolved {
                source: "fallback".to_string(),
                task_count: 3,
            },
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            assert!(json.contains(&format!(r#""type":"{}""#, event.kind())));
        }
    }
}
