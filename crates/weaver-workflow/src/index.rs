use std::collections::HashMap;

use crate::error::WorkflowError;
use crate::step::Step;
use crate::workflow::Workflow;

/// Where a step sits in the hierarchy, as indices into the owning vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
  pub level: usize,
  pub thread: usize,
  pub step: usize,
}

/// Workflow-wide lookup of steps by id.
///
/// Built once from a locked workflow and never mutated afterwards. Lookups
/// span every level and thread, so explicit `NEXT` and branch targets may
/// jump anywhere.
#[derive(Debug, Clone)]
pub struct StepIndex<'w> {
  workflow: &'w Workflow,
  positions: HashMap<&'w str, StepPosition>,
}

impl<'w> StepIndex<'w> {
  /// Flatten the workflow. Fails on the first repeated step id.
  pub fn build(workflow: &'w Workflow) -> Result<Self, WorkflowError> {
    let mut positions = HashMap::new();

    for (level_idx, level) in workflow.levels.iter().enumerate() {
      for (thread_idx, thread) in level.threads.iter().enumerate() {
        for (step_idx, step) in thread.steps.iter().enumerate() {
          let position = StepPosition {
            level: level_idx,
            thread: thread_idx,
            step: step_idx,
          };
          if positions.insert(step.step_id.as_str(), position).is_some() {
            return Err(WorkflowError::DuplicateStepId {
              step_id: step.step_id.clone(),
            });
          }
        }
      }
    }

    Ok(Self {
      workflow,
      positions,
    })
  }

  pub fn find(&self, step_id: &str) -> Result<&'w Step, WorkflowError> {
    let position = self.position(step_id)?;
    Ok(&self.workflow.levels[position.level].threads[position.thread].steps[position.step])
  }

  pub fn position(&self, step_id: &str) -> Result<StepPosition, WorkflowError> {
    self
      .positions
      .get(step_id)
      .copied()
      .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))
  }

  pub fn contains(&self, step_id: &str) -> bool {
    self.positions.contains_key(step_id)
  }

  pub fn len(&self) -> usize {
    self.positions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn workflow(&self) -> &'w Workflow {
    self.workflow
  }
}
