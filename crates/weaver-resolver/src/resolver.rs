use tracing::{info, instrument, warn};
use weaver_config::WorkflowDef;
use weaver_workflow::{LinkGraph, LinkedWorkflow, StepIndex, WorkflowError};

use crate::error::{ResolveError, SchemaError};
use crate::link::LinkResolver;
use crate::validate::{lock, validate_references};

/// Resolver transforms a WorkflowDef into a linked workflow.
pub trait Resolver {
  /// Resolve a pipeline definition into a linked workflow.
  ///
  /// This process:
  /// 1. Validates the hierarchy (level ids, non-empty containers, branch targets)
  /// 2. Builds the workflow-wide step index (unique step ids)
  /// 3. Checks every step reference against the index
  /// 4. Resolves the successor of every step
  fn resolve(&self, def: WorkflowDef) -> Result<LinkedWorkflow, ResolveError>;
}

/// Standard resolver implementation.
#[derive(Debug, Clone, Default)]
pub struct StandardResolver {
  deny_cycles: bool,
}

impl StandardResolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reject workflows whose links form a cycle instead of only warning.
  ///
  /// Branch steps looping back to poll an earlier step are legal in most
  /// targets, so cycles are allowed unless asked otherwise.
  pub fn deny_cycles(mut self, deny: bool) -> Self {
    self.deny_cycles = deny;
    self
  }
}

impl Resolver for StandardResolver {
  #[instrument(name = "workflow_resolve", skip_all, fields(levels = def.levels.len(), steps = def.step_count()))]
  fn resolve(&self, def: WorkflowDef) -> Result<LinkedWorkflow, ResolveError> {
    let workflow = lock(def)?;

    let links = {
      let index = StepIndex::build(&workflow).map_err(|e| match e {
        WorkflowError::DuplicateStepId { step_id } => {
          ResolveError::from(SchemaError::DuplicateStepId { step_id })
        }
        other => ResolveError::from(other),
      })?;
      validate_references(&index)?;
      LinkResolver::new(&index).resolve()?
    };

    let graph = LinkGraph::new(&workflow, &links);
    let join_points = graph.join_points();
    if !join_points.is_empty() {
      info!(join_points = ?join_points, "join_points_detected");
    }
    if let Some(cycle) = graph.find_cycle() {
      if self.deny_cycles {
        return Err(ResolveError::CycleDetected { steps: cycle });
      }
      warn!(cycle = ?cycle, "cycle_detected");
    }

    info!(
      levels = workflow.levels.len(),
      steps = links.len(),
      "workflow_resolved"
    );

    Ok(LinkedWorkflow { workflow, links })
  }
}
