use std::fmt;

use thiserror::Error;
use weaver_workflow::WorkflowError;

/// Structural problems in a pipeline definition.
#[derive(Debug, Error)]
pub enum SchemaError {
  /// The definition declares no levels at all.
  #[error("workflow has no levels")]
  EmptyWorkflow,

  /// Level ids must parse as integers.
  #[error("invalid level id '{level_id}': expected an integer")]
  InvalidLevelId { level_id: String },

  /// Two levels share an id.
  #[error("duplicate level id: {level_id}")]
  DuplicateLevelId { level_id: i64 },

  /// Levels must be declared in ascending id order.
  #[error("level {level_id} is declared after level {previous}; levels must be in ascending order")]
  LevelOrder { level_id: i64, previous: i64 },

  /// A level declares no threads.
  #[error("level {level_id} has no threads")]
  EmptyLevel { level_id: i64 },

  /// Two threads of the same level share an id.
  #[error("duplicate thread id '{thread_id}' in level {level_id}")]
  DuplicateThreadId { level_id: i64, thread_id: String },

  /// A thread declares no steps.
  #[error("thread '{thread_id}' in level {level_id} has no steps")]
  EmptyThread { level_id: i64, thread_id: String },

  /// Step ids must be unique across the whole workflow.
  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  /// A boolean choice must name the step whose result it inspects.
  #[error("boolean_choice step '{step_id}' does not name a source step in READ_INPUT_FROM")]
  MissingBranchSource { step_id: String },
}

/// The definition field a step reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceField {
  Next,
  TrueJob,
  FalseJob,
  ReadInputFrom,
}

impl fmt::Display for ReferenceField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ReferenceField::Next => "NEXT",
      ReferenceField::TrueJob => "TRUE_JOB",
      ReferenceField::FalseJob => "FALSE_JOB",
      ReferenceField::ReadInputFrom => "READ_INPUT_FROM",
    })
  }
}

/// Errors that can occur during validation and link resolution.
///
/// All of them are fatal: no artifact is produced from a workflow that
/// fails to resolve.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Malformed hierarchy or duplicate ids.
  #[error("schema validation failed: {0}")]
  Schema(#[from] SchemaError),

  /// A step id reference that matches no step anywhere in the workflow.
  #[error("step '{step_id}' references unknown step '{target}' via {field}")]
  UnresolvedReference {
    step_id: String,
    field: ReferenceField,
    target: String,
  },

  /// A boolean choice without one of its branch targets.
  #[error("boolean_choice step '{step_id}' is missing {branch}")]
  MissingBranchTarget {
    step_id: String,
    branch: ReferenceField,
  },

  /// Failure inside the locked model.
  #[error("workflow error: {0}")]
  Workflow(#[from] WorkflowError),

  /// Resolved links form a cycle and the resolver was asked to reject them.
  #[error("cycle detected through steps: {}", steps.join(" -> "))]
  CycleDetected { steps: Vec<String> },
}
