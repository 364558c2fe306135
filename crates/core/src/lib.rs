pub mod domain;
pub mod error;

pub use domain::context::PipelineContext;
pub use domain::inventory::{FileInventory, FileMeta};
pub use domain::phase::Phase;
pub use domain::profile::{ModelProfile, PhaseModels, DEFAULT_MODEL};
pub use domain::result::{
    PhaseResult, PhaseStatus, PipelineOutcome, RunStatus, TaskResult, TaskStatus,
};
pub use domain::task::{PlanOutcome, PlanSource, TaskDefinition};
pub use error::CoreError;
