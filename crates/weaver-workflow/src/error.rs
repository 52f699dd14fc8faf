use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("step not found: {0}")]
  StepNotFound(String),

  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },
}
