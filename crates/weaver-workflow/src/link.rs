use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::workflow::{Workflow, level_symbol, thread_symbol};

/// Where control goes after a step (or after one branch of a step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Successor {
  /// Another step, anywhere in the workflow.
  Step { step_id: String, symbol: String },
  /// Fan-out barrier at the start of a multi-thread level.
  Level { level_id: i64 },
  /// Direct chain into the only thread of the next level.
  Thread { level_id: i64, thread_id: String },
  /// Thread-local completion; the enclosing level's barrier takes over.
  Continue,
  /// Workflow completion.
  End,
}

impl Successor {
  /// The symbol templates receive for this successor.
  pub fn symbol(&self) -> String {
    match self {
      Successor::Step { symbol, .. } => symbol.clone(),
      Successor::Level { level_id } => level_symbol(*level_id),
      Successor::Thread {
        level_id,
        thread_id,
      } => thread_symbol(*level_id, thread_id),
      Successor::Continue => "continue".to_string(),
      Successor::End => "end".to_string(),
    }
  }
}

impl fmt::Display for Successor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.symbol())
  }
}

/// The step a boolean choice inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSource {
  pub step_id: String,
  pub symbol: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result_variable: Option<String>,
}

/// Resolved control flow out of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
  /// Invocation steps have exactly one successor.
  Next(Successor),
  /// Boolean choices have one successor per outcome.
  Branch {
    on_true: Successor,
    on_false: Successor,
    source: BranchSource,
  },
}

impl Link {
  /// Successors in (true, false) order for branches.
  pub fn successors(&self) -> Vec<&Successor> {
    match self {
      Link::Next(next) => vec![next],
      Link::Branch {
        on_true, on_false, ..
      } => vec![on_true, on_false],
    }
  }
}

/// Resolved links keyed by step id, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable {
  links: IndexMap<String, Link>,
}

impl LinkTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record the link of a step. Returns the previous link, if any.
  pub fn insert(&mut self, step_id: impl Into<String>, link: Link) -> Option<Link> {
    self.links.insert(step_id.into(), link)
  }

  pub fn get(&self, step_id: &str) -> Option<&Link> {
    self.links.get(step_id)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Link)> {
    self.links.iter()
  }

  pub fn len(&self) -> usize {
    self.links.len()
  }

  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }
}

/// A locked workflow together with the links resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedWorkflow {
  pub workflow: Workflow,
  pub links: LinkTable,
}

impl LinkedWorkflow {
  pub fn link(&self, step_id: &str) -> Option<&Link> {
    self.links.get(step_id)
  }
}
