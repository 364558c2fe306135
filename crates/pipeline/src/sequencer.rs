//! Phase sequencer driving a survey run from discovery to report
//!
//! Phases execute strictly in ordinal order. A required phase that exhausts
//! its attempts aborts the run; an optional one degrades it and the run
//! carries on. The dynamic phase fans out to the task scheduler. Whatever
//! happens, the caller gets a `PipelineOutcome` with every phase result
//! recorded so far, never a bare error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use events::{Event, EventBus};
use surveyor_core::{
    FileInventory, Phase, PhaseModels, PhaseResult, PhaseStatus, PipelineContext, PipelineOutcome,
    PlanOutcome, RunStatus,
};

use crate::backend::{invoke_with_timeout, ReasoningRequest, ReasoningService};
use crate::error::{PipelineError, Result};
use crate::fallback::FallbackPolicy;
use crate::plan_parser::parse_plan;
use crate::prompts::PhasePrompts;
use crate::retry::RetryPolicy;
use crate::scheduler::TaskScheduler;
use crate::state::{PhaseFlow, RunState};

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Everything a run needs, fixed up front. No hidden globals; tests hand in
/// whatever timings they want.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub models: PhaseModels,
    /// Upper bound on concurrent reasoning calls in the dynamic phase.
    pub concurrency: usize,
    /// Per-call deadline, phases and tasks alike.
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    /// Display name of the surveyed project.
    pub project: String,
}

impl PipelineConfig {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn with_models(mut self, models: PhaseModels) -> Self {
        self.models = models;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: PhaseModels::default(),
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            project: "project".to_string(),
        }
    }
}

pub struct PhaseSequencer {
    service: Arc<dyn ReasoningService>,
    config: PipelineConfig,
    events: Option<EventBus>,
    cancel: CancellationToken,
}

impl PhaseSequencer {
    pub fn new(service: Arc<dyn ReasoningService>, config: PipelineConfig) -> Self {
        Self {
            service,
            config,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Use an externally owned token so the caller can abort the run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the full phase sequence over the scanned inventory.
    ///
    /// Always returns an outcome: a fatal abort surfaces as
    /// `RunStatus::Fatal` with the phase results gathered up to that point,
    /// and degraded phases as `RunStatus::Degraded` plus warnings.
    pub async fn run(&self, inventory: FileInventory) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            project = %self.config.project,
            files = inventory.len(),
            "starting survey run"
        );
        self.emit(
            run_id,
            Event::RunStarted {
                project: self.config.project.clone(),
                file_count: inventory.len(),
            },
        );

        let mut context = PipelineContext::new(inventory);
        let mut warnings = Vec::new();

        let failure = match self.drive(run_id, &mut context, &mut warnings).await {
            Ok(()) => None,
            Err(err) => {
                error!(run_id = %run_id, error = %err, "run aborted");
                Some(err.to_string())
            }
        };

        let status = if failure.is_some() {
            RunStatus::Fatal
        } else if warnings.is_empty() {
            RunStatus::Complete
        } else {
            RunStatus::Degraded
        };

        info!(run_id = %run_id, status = status.as_str(), "run finished");
        self.emit(
            run_id,
            Event::RunCompleted {
                status: status.as_str().to_string(),
                warning_count: warnings.len(),
            },
        );

        PipelineOutcome {
            run_id,
            status,
            results: context.into_results(),
            warnings,
            failure,
            started_at,
            completed_at: Utc::now(),
        }
    }

    async fn drive(
        &self,
        run_id: Uuid,
        context: &mut PipelineContext,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let mut state = RunState::Pending;

        for phase in Phase::SEQUENCE {
            // New work never starts after a cancel; in-flight work is
            // handled inside the phase runners.
            if self.cancel.is_cancelled() {
                self.transition(&mut state, RunState::Aborted)?;
                return Err(PipelineError::Cancelled);
            }

            self.transition(&mut state, RunState::Running(phase.ordinal()))?;
            info!(phase = phase.name(), ordinal = phase.ordinal(), "phase started");
            self.emit(
                run_id,
                Event::PhaseStarted {
                    phase: phase.as_str().to_string(),
                    ordinal: phase.ordinal(),
                },
            );

            let result = if phase.is_dynamic() {
                self.run_dynamic_phase(run_id, phase, context).await
            } else {
                match self.run_sequential_phase(phase, context).await {
                    Ok(result) => result,
                    Err(err) => {
                        // A required phase died. Stop whatever is still
                        // pending and hand back what we have.
                        self.cancel.cancel();
                        self.emit(
                            run_id,
                            Event::PhaseCompleted {
                                phase: phase.as_str().to_string(),
                                ordinal: phase.ordinal(),
                                status: PhaseStatus::Fatal.as_str().to_string(),
                            },
                        );
                        self.transition(&mut state, RunState::Aborted)?;
                        return Err(err);
                    }
                }
            };

            self.emit(
                run_id,
                Event::PhaseCompleted {
                    phase: phase.as_str().to_string(),
                    ordinal: phase.ordinal(),
                    status: result.status.as_str().to_string(),
                },
            );

            let fatal = result.status == PhaseStatus::Fatal;
            if result.status == PhaseStatus::Degraded {
                warnings.push(format!("phase {} degraded", phase.name()));
                for name in result.failed_task_names() {
                    warnings.push(format!("task '{name}' failed in phase {}", phase.name()));
                }
            }

            context.push(result)?;

            if fatal {
                self.cancel.cancel();
                self.transition(&mut state, RunState::Aborted)?;
                return Err(PipelineError::AllTasksFailed { phase });
            }
        }

        self.transition(&mut state, RunState::Completed)?;
        Ok(())
    }

    /// One reasoning call for a sequential phase, with retry on transient
    /// failures. Required phases turn exhaustion into an error; optional
    /// ones settle for a degraded result.
    async fn run_sequential_phase(
        &self,
        phase: Phase,
        context: &PipelineContext,
    ) -> Result<PhaseResult> {
        let started_at = Utc::now();
        let profile = self.config.models.profile(phase);
        let role = PhasePrompts::role(phase);
        let instructions = PhasePrompts::instructions(phase, context.inventory());
        let snapshot = context.transcript();

        let mut attempt: u32 = 1;
        loop {
            let request = ReasoningRequest {
                phase,
                role,
                instructions: &instructions,
                context_snapshot: &snapshot,
                profile,
            };

            // Completed calls win over cancellation; only pending work is
            // abandoned.
            let call = tokio::select! {
                biased;
                outcome = invoke_with_timeout(
                    self.service.as_ref(),
                    self.config.call_timeout,
                    request,
                ) => outcome,
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            };

            match call {
                Ok(payload) => {
                    debug!(phase = phase.name(), attempt, "phase call succeeded");
                    return Ok(PhaseResult::complete(phase, payload, started_at));
                }
                Err(err) if err.is_transient() && attempt < self.config.retry.max_attempts => {
                    let delay = self.config.retry.delay_for(attempt);
                    warn!(
                        phase = phase.name(),
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "transient phase failure, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) if phase.is_required() => {
                    error!(phase = phase.name(), attempt, error = %err, "required phase failed");
                    return Err(PipelineError::phase_failed(phase, attempt, err.to_string()));
                }
                Err(err) => {
                    warn!(
                        phase = phase.name(),
                        attempt,
                        error = %err,
                        "optional phase failed, continuing degraded"
                    );
                    return Ok(PhaseResult::degraded(phase, started_at));
                }
            }
        }
    }

    /// Resolve the task plan and fan it out through the scheduler. Never
    /// errors by itself; an all-failed task set comes back as a fatal
    /// result for the caller to act on.
    async fn run_dynamic_phase(
        &self,
        run_id: Uuid,
        phase: Phase,
        context: &PipelineContext,
    ) -> PhaseResult {
        let started_at = Utc::now();
        let profile = self.config.models.profile(phase).clone();

        let planning = context
            .result_for(Phase::Planning)
            .filter(|result| result.status == PhaseStatus::Complete);
        let plan = match planning {
            Some(result) => parse_plan(&result.payload, context.inventory(), &profile),
            None => {
                warn!("no usable planning output; using fallback roles");
                PlanOutcome::fallback(FallbackPolicy::tasks(context.inventory(), &profile))
            }
        };

        info!(
            source = plan.source.as_str(),
            tasks = plan.tasks.len(),
            "analysis plan resolved"
        );
        self.emit(
            run_id,
            Event::PlanResolved {
                source: plan.source.as_str().to_string(),
                task_count: plan.tasks.len(),
            },
        );

        let mut scheduler = TaskScheduler::new(
            self.config.concurrency,
            self.config.call_timeout,
            self.config.retry,
        )
        .with_cancellation(self.cancel.child_token());
        if let Some(bus) = &self.events {
            scheduler = scheduler.with_events(bus.clone(), run_id);
        }

        let snapshot: Arc<str> = Arc::from(context.transcript());
        let results = scheduler
            .execute(Arc::clone(&self.service), plan.tasks, snapshot)
            .await;

        PhaseResult::from_tasks(phase, results, started_at)
    }

    fn transition(&self, state: &mut RunState, next: RunState) -> Result<()> {
        PhaseFlow::validate_transition(state, &next)?;
        debug!(from = %state, to = %next, "run state transition");
        *state = next;
        Ok(())
    }

    fn emit(&self, run_id: Uuid, event: Event) {
        if let Some(bus) = &self.events {
            bus.emit(run_id, event);
        }
    }
}
