use serde::{Deserialize, Serialize};

use crate::level::LevelDef;

/// A full pipeline definition, serialized as a bare array of levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowDef {
  pub levels: Vec<LevelDef>,
}

impl WorkflowDef {
  /// Total number of steps across every level and thread.
  pub fn step_count(&self) -> usize {
    self
      .levels
      .iter()
      .flat_map(|level| &level.threads)
      .map(|thread| thread.steps.len())
      .sum()
  }
}
