use serde::{Deserialize, Serialize};

use crate::step::Step;

/// A locked workflow: levels in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub levels: Vec<Level>,
}

impl Workflow {
  /// Get a level by its id. Ids need not be contiguous.
  pub fn level(&self, level_id: i64) -> Option<&Level> {
    self.levels.iter().find(|level| level.level_id == level_id)
  }

  /// The level with id `level_id + 1`, if one was declared.
  pub fn next_level(&self, level_id: i64) -> Option<&Level> {
    level_id.checked_add(1).and_then(|id| self.level(id))
  }

  /// All steps in traversal order (level, thread, step).
  pub fn steps(&self) -> impl Iterator<Item = &Step> {
    self
      .levels
      .iter()
      .flat_map(|level| &level.threads)
      .flat_map(|thread| &thread.steps)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
  pub level_id: i64,
  pub threads: Vec<Thread>,
}

impl Level {
  pub fn symbol(&self) -> String {
    level_symbol(self.level_id)
  }

  /// A single-thread level needs no barrier and may render unwrapped.
  pub fn is_single_thread(&self) -> bool {
    self.threads.len() == 1
  }
}

/// A sequential chain of steps. Never empty once locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
  pub thread_id: String,
  pub steps: Vec<Step>,
}

impl Thread {
  pub fn symbol(&self, level_id: i64) -> String {
    thread_symbol(level_id, &self.thread_id)
  }

  /// First step of the thread.
  pub fn head(&self) -> Option<&Step> {
    self.steps.first()
  }
}

pub(crate) fn level_symbol(level_id: i64) -> String {
  format!("Level_{}", level_id)
}

pub(crate) fn thread_symbol(level_id: i64, thread_id: &str) -> String {
  format!("Level_{}_Thread_{}", level_id, thread_id)
}
