//! Link resolution: which step runs after which.
//!
//! For every step, in a single forward pass over each thread:
//!
//! 1. An explicit `NEXT` wins and may point anywhere in the workflow.
//! 2. Otherwise the following step of the same thread.
//! 3. Otherwise the thread tail rule:
//!
//! | next level exists | sole thread | successor |
//! |---|---|---|
//! | yes | yes | `Level_{N+1}` barrier if that level is parallel, else `Level_{N+1}_Thread_{T}` |
//! | yes | no  | `continue` |
//! | no  | yes | `end` |
//! | no  | no  | `continue` |
//!
//! Boolean choices skip all of the above and resolve both branch targets
//! through the index.
//!
//! Links never depend on how a level is later rendered, so single-thread
//! collapse happens strictly after this pass.

use tracing::{debug, trace};
use weaver_workflow::{
  Branch, BranchSource, Level, Link, LinkTable, Step, StepIndex, Successor, Thread, Workflow,
};

use crate::error::{ReferenceField, ResolveError};

/// Where a step sits relative to the end of its thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThreadPosition<'w> {
  /// Another step follows in the same thread.
  HasSuccessor(&'w Step),
  /// Last step of the thread.
  Tail,
}

impl<'w> ThreadPosition<'w> {
  pub fn of(thread: &'w Thread, position: usize) -> Self {
    match thread.steps.get(position + 1) {
      Some(next) => ThreadPosition::HasSuccessor(next),
      None => ThreadPosition::Tail,
    }
  }
}

/// Resolves successors for every step of a workflow.
pub struct LinkResolver<'a, 'w> {
  index: &'a StepIndex<'w>,
}

impl<'a, 'w> LinkResolver<'a, 'w> {
  pub fn new(index: &'a StepIndex<'w>) -> Self {
    Self { index }
  }

  fn workflow(&self) -> &'w Workflow {
    self.index.workflow()
  }

  /// Resolve links for all steps, in level, thread, step order.
  pub fn resolve(&self) -> Result<LinkTable, ResolveError> {
    let mut table = LinkTable::new();

    for level in &self.workflow().levels {
      for thread in &level.threads {
        for (position, step) in thread.steps.iter().enumerate() {
          let link = self.resolve_step(level, thread, step, position)?;
          debug!(
            step_id = %step.step_id,
            level_id = level.level_id,
            thread_id = %thread.thread_id,
            successors = ?link.successors(),
            "link_resolved"
          );
          table.insert(step.step_id.clone(), link);
        }
      }
    }

    Ok(table)
  }

  fn resolve_step(
    &self,
    level: &Level,
    thread: &'w Thread,
    step: &Step,
    position: usize,
  ) -> Result<Link, ResolveError> {
    if let Some(branch) = step.kind.branch() {
      return self.resolve_branch(step, branch);
    }

    if let Some(next) = step.explicit_next() {
      trace!(step_id = %step.step_id, next, "explicit_next");
      let target = self.lookup(step, ReferenceField::Next, next)?;
      return Ok(Link::Next(step_successor(target)));
    }

    let successor = match ThreadPosition::of(thread, position) {
      ThreadPosition::HasSuccessor(next) => step_successor(next),
      ThreadPosition::Tail => self.thread_tail(level),
    };

    Ok(Link::Next(successor))
  }

  /// Successor of the last step of a thread in `level`.
  pub fn thread_tail(&self, level: &Level) -> Successor {
    let next_level = self.workflow().next_level(level.level_id);

    match (next_level, level.is_single_thread()) {
      (Some(next), true) => match next.threads.as_slice() {
        [only] => Successor::Thread {
          level_id: next.level_id,
          thread_id: only.thread_id.clone(),
        },
        _ => Successor::Level {
          level_id: next.level_id,
        },
      },
      (None, true) => Successor::End,
      (_, false) => Successor::Continue,
    }
  }

  fn resolve_branch(&self, step: &Step, branch: &Branch) -> Result<Link, ResolveError> {
    let source = self.lookup(step, ReferenceField::ReadInputFrom, &branch.source)?;
    let on_true = self.lookup(step, ReferenceField::TrueJob, &branch.on_true)?;
    let on_false = self.lookup(step, ReferenceField::FalseJob, &branch.on_false)?;

    Ok(Link::Branch {
      on_true: step_successor(on_true),
      on_false: step_successor(on_false),
      source: BranchSource {
        step_id: source.step_id.clone(),
        symbol: source.symbol(),
        result_variable: source.result_variable().map(str::to_string),
      },
    })
  }

  fn lookup(
    &self,
    step: &Step,
    field: ReferenceField,
    target: &str,
  ) -> Result<&'w Step, ResolveError> {
    self
      .index
      .find(target)
      .map_err(|_| ResolveError::UnresolvedReference {
        step_id: step.step_id.clone(),
        field,
        target: target.to_string(),
      })
  }
}

fn step_successor(step: &Step) -> Successor {
  Successor::Step {
    step_id: step.step_id.clone(),
    symbol: step.symbol(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use weaver_workflow::{Call, StepKind};

  fn make_step(id: &str) -> Step {
    Step {
      step_id: id.to_string(),
      name: "job".to_string(),
      kind: StepKind::Sync {
        function_name: "fn".to_string(),
        call: Call::default(),
      },
    }
  }

  fn make_thread(thread_id: &str, ids: &[&str]) -> Thread {
    Thread {
      thread_id: thread_id.to_string(),
      steps: ids.iter().map(|id| make_step(id)).collect(),
    }
  }

  fn make_level(level_id: i64, threads: Vec<Thread>) -> Level {
    Level { level_id, threads }
  }

  #[test]
  fn test_thread_position_by_bounds() {
    let thread = make_thread("1", &["A", "B"]);
    assert!(matches!(
      ThreadPosition::of(&thread, 0),
      ThreadPosition::HasSuccessor(step) if step.step_id == "B"
    ));
    assert_eq!(ThreadPosition::of(&thread, 1), ThreadPosition::Tail);
  }

  #[test]
  fn test_thread_tail_decision_table() {
    let workflow = Workflow {
      levels: vec![
        make_level(1, vec![make_thread("1", &["A"])]),
        make_level(2, vec![make_thread("1", &["B"]), make_thread("2", &["C"])]),
        make_level(3, vec![make_thread("5", &["D"])]),
        make_level(4, vec![make_thread("1", &["E"]), make_thread("2", &["F"])]),
        // gap: no levels 5 and 6
        make_level(7, vec![make_thread("1", &["G"])]),
      ],
    };
    let index = StepIndex::build(&workflow).unwrap();
    let resolver = LinkResolver::new(&index);
    let levels = &workflow.levels;

    assert_eq!(
      resolver.thread_tail(&levels[0]),
      Successor::Level { level_id: 2 }
    );
    // Parallel level: tails continue even though level 3 is single-thread
    assert_eq!(resolver.thread_tail(&levels[1]), Successor::Continue);
    assert_eq!(
      resolver.thread_tail(&levels[2]),
      Successor::Level { level_id: 4 }
    );
    // Parallel level, no level 5
    assert_eq!(resolver.thread_tail(&levels[3]), Successor::Continue);
    assert_eq!(resolver.thread_tail(&levels[4]), Successor::End);
  }

  #[test]
  fn test_direct_chain_uses_next_level_thread_id() {
    let workflow = Workflow {
      levels: vec![
        make_level(1, vec![make_thread("1", &["X"])]),
        make_level(2, vec![make_thread("3", &["Y"])]),
      ],
    };
    let index = StepIndex::build(&workflow).unwrap();
    let resolver = LinkResolver::new(&index);

    assert_eq!(
      resolver.thread_tail(&workflow.levels[0]),
      Successor::Thread {
        level_id: 2,
        thread_id: "3".to_string()
      }
    );
  }
}
