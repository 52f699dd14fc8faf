use serde::{Deserialize, Serialize};

use crate::step::StepDef;

/// A synchronization stage. All of its threads run concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LevelDef {
  /// String-typed integer, e.g. "1". Parsed during validation.
  pub level_id: String,
  pub threads: Vec<ThreadDef>,
}

/// A sequential chain of steps inside a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ThreadDef {
  pub thread_id: String,
  pub steps: Vec<StepDef>,
}
