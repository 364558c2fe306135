//! Bounded concurrent execution of planned analysis tasks
//!
//! Tasks run under a semaphore so at most `concurrency` reasoning calls are
//! in flight, each call capped by a timeout, transient failures retried with
//! backoff. One task failing never disturbs its siblings. Results come back
//! re-sorted into definition order regardless of completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use events::{Event, EventBus};
use surveyor_core::{Phase, TaskDefinition, TaskResult};

use crate::backend::{invoke_with_timeout, ReasoningRequest, ReasoningService};
use crate::prompts::PhasePrompts;
use crate::retry::RetryPolicy;

pub struct TaskScheduler {
    concurrency: usize,
    call_timeout: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
    events: Option<(EventBus, Uuid)>,
}

impl TaskScheduler {
    pub fn new(concurrency: usize, call_timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            concurrency: concurrency.max(1),
            call_timeout,
            retry,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Use an externally owned token so the caller can abort mid-run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, bus: EventBus, run_id: Uuid) -> Self {
        self.events = Some((bus, run_id));
        self
    }

    /// Run every task and return one result per definition, in definition
    /// order. Infallible: a task that exhausts its attempts (or is cancelled
    /// before starting) yields a failed result, not an error.
    pub async fn execute(
        &self,
        service: Arc<dyn ReasoningService>,
        tasks: Vec<TaskDefinition>,
        snapshot: Arc<str>,
    ) -> Vec<TaskResult> {
        if tasks.is_empty() {
            debug!("no tasks to schedule");
            return Vec::new();
        }

        info!(
            tasks = tasks.len(),
            concurrency = self.concurrency,
            "scheduling analysis tasks"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let service = Arc::clone(&service);
            let snapshot = Arc::clone(&snapshot);
            let cancel = self.cancel.clone();
            let events = self.events.clone();
            let call_timeout = self.call_timeout;
            let retry = self.retry;

            futures.push(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return (
                            index,
                            TaskResult::failed(task.name, "cancelled before start", 0, 0),
                        );
                    }
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            return (
                                index,
                                TaskResult::failed(task.name, "scheduler unavailable", 0, 0),
                            );
                        }
                    },
                };

                if let Some((bus, run_id)) = &events {
                    bus.emit(
                        *run_id,
                        Event::TaskStarted {
                            task_name: task.name.clone(),
                        },
                    );
                }

                let result = run_task(
                    service.as_ref(),
                    &task,
                    &snapshot,
                    call_timeout,
                    retry,
                    &cancel,
                )
                .await;

                if let Some((bus, run_id)) = &events {
                    bus.emit(
                        *run_id,
                        Event::TaskCompleted {
                            task_name: result.task_name.clone(),
                            status: result.status.as_str().to_string(),
                            attempts: result.attempts,
                        },
                    );
                }

                (index, result)
            });
        }

        let mut indexed = Vec::new();
        while let Some(entry) = futures.next().await {
            indexed.push(entry);
        }

        // Completion order is arbitrary; callers see definition order.
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

async fn run_task(
    service: &dyn ReasoningService,
    task: &TaskDefinition,
    snapshot: &str,
    call_timeout: Duration,
    retry: RetryPolicy,
    cancel: &CancellationToken,
) -> TaskResult {
    let instructions = PhasePrompts::task_instructions(task);
    let started = Instant::now();
    let mut attempt: u32 = 1;

    loop {
        let request = ReasoningRequest {
            phase: Phase::Analysis,
            role: &task.name,
            instructions: &instructions,
            context_snapshot: snapshot,
            profile: &task.profile,
        };

        // Completed calls win over cancellation; only pending work is
        // abandoned.
        let call = tokio::select! {
            biased;
            outcome = invoke_with_timeout(service, call_timeout, request) => outcome,
            _ = cancel.cancelled() => {
                return TaskResult::failed(
                    task.name.clone(),
                    "cancelled",
                    started.elapsed().as_millis() as u64,
                    attempt,
                );
            }
        };

        match call {
            Ok(payload) => {
                debug!(task = %task.name, attempt, "task succeeded");
                return TaskResult::succeeded(
                    task.name.clone(),
                    payload,
                    started.elapsed().as_millis() as u64,
                    attempt,
                );
            }
            Err(err) if err.is_transient() && attempt < retry.max_attempts => {
                let delay = retry.delay_for(attempt);
                warn!(
                    task = %task.name,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "transient task failure, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return TaskResult::failed(
                            task.name.clone(),
                            "cancelled",
                            started.elapsed().as_millis() as u64,
                            attempt,
                        );
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(err) => {
                warn!(task = %task.name, attempt, error = %err, "task failed");
                return TaskResult::failed(
                    task.name.clone(),
                    err.to_string(),
                    started.elapsed().as_millis() as u64,
                    attempt,
                );
            }
        }
    }
}
