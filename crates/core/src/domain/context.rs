use serde::{Deserialize, Serialize};

use crate::domain::inventory::FileInventory;
use crate::domain::phase::Phase;
use crate::domain::result::PhaseResult;
use crate::error::CoreError;

/// Append-only record of every finished phase, plus the inventory snapshot
/// they all share.
///
/// The sequencer is the only writer, and phases run strictly one after
/// another, so a plain `Vec` behind `push` is all the synchronization this
/// needs. Results are only handed out by shared reference; nothing can
/// rewrite a prior phase's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineContext {
    inventory: FileInventory,
    results: Vec<PhaseResult>,
}

impl PipelineContext {
    pub fn new(inventory: FileInventory) -> Self {
        Self {
            inventory,
            results: Vec::new(),
        }
    }

    /// Append the next phase's result. Ordinals must strictly increase.
    pub fn push(&mut self, result: PhaseResult) -> Result<(), CoreError> {
        if let Some(last) = self.results.last() {
            if result.ordinal() <= last.ordinal() {
                return Err(CoreError::OutOfOrderResult {
                    prev: last.ordinal(),
                    next: result.ordinal(),
                });
            }
        }
        self.results.push(result);
        Ok(())
    }

    pub fn results(&self) -> &[PhaseResult] {
        &self.results
    }

    pub fn result_for(&self, phase: Phase) -> Option<&PhaseResult> {
        self.results.iter().find(|result| result.phase == phase)
    }

    pub fn inventory(&self) -> &FileInventory {
        &self.inventory
    }

    pub fn into_results(self) -> Vec<PhaseResult> {
        self.results
    }

    /// Render the accumulated findings for the next phase's prompt.
    ///
    /// Every prior phase appears, in order, so no later phase's request
    /// lacks an earlier phase's result.
    pub fn transcript(&self) -> String {
        let mut sections = Vec::with_capacity(self.results.len());
        for result in &self.results {
            let body = if result.payload.is_empty() {
                format!("(no findings; phase was {})", result.status.as_str())
            } else {
                result.payload.clone()
            };
            sections.push(format!("## {}\n\n{}", result.phase.name(), body));
        }
        sections.join("\n\n")
    }
}
