//! Survey pipeline: phase sequencing, task planning, and bounded fan-out
//!
//! The [`PhaseSequencer`] drives a run phase by phase over a reasoning
//! backend. Sequential phases make one call each; the dynamic analysis
//! phase parses the planner's output into tasks (or falls back to generic
//! roles) and executes them concurrently through the [`TaskScheduler`].
//! Transient backend failures are retried with exponential backoff, and
//! required-phase exhaustion aborts the run while preserving every result
//! gathered so far.

pub mod backend;
pub mod backends;
pub mod error;
pub mod fallback;
pub mod plan_parser;
pub mod prompts;
pub mod retry;
pub mod scheduler;
pub mod sequencer;
pub mod state;

pub use backend::{invoke_with_timeout, ReasoningError, ReasoningRequest, ReasoningService};
pub use backends::OpenRouterBackend;
pub use error::{PipelineError, Result};
pub use fallback::FallbackPolicy;
pub use plan_parser::parse_plan;
pub use prompts::PhasePrompts;
pub use retry::RetryPolicy;
pub use scheduler::TaskScheduler;
pub use sequencer::{PhaseSequencer, PipelineConfig};
pub use state::{PhaseFlow, RunState};
