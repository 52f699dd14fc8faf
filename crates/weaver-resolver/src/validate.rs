//! Structural validation of pipeline definitions.
//!
//! [`lock`] turns a definition into the typed model and rejects malformed
//! hierarchies. [`validate_references`] then checks every step id a step
//! mentions against the workflow-wide index. Both run before any link is
//! resolved.

use std::collections::HashSet;

use weaver_config::{CallOptions, LevelDef, StepDef, StepType, ThreadDef, WorkflowDef};
use weaver_workflow::{Branch, Call, Level, Step, StepIndex, StepKind, Thread, Workflow};

use crate::error::{ReferenceField, ResolveError, SchemaError};

/// Validate the hierarchy of a definition and convert it into a locked workflow.
///
/// Levels must be declared in ascending id order. Gaps are tolerated; a
/// missing `N+1` level means the thread tails of level `N` have no next level.
pub fn lock(def: WorkflowDef) -> Result<Workflow, ResolveError> {
  if def.levels.is_empty() {
    return Err(SchemaError::EmptyWorkflow.into());
  }

  let mut level_ids = HashSet::new();
  let mut levels: Vec<Level> = Vec::with_capacity(def.levels.len());
  for level_def in def.levels {
    let level = lock_level(level_def)?;
    if !level_ids.insert(level.level_id) {
      return Err(
        SchemaError::DuplicateLevelId {
          level_id: level.level_id,
        }
        .into(),
      );
    }
    if let Some(previous) = levels.last()
      && previous.level_id > level.level_id
    {
      return Err(
        SchemaError::LevelOrder {
          level_id: level.level_id,
          previous: previous.level_id,
        }
        .into(),
      );
    }
    levels.push(level);
  }

  Ok(Workflow { levels })
}

fn lock_level(def: LevelDef) -> Result<Level, ResolveError> {
  let level_id = parse_level_id(&def.level_id)?;
  if def.threads.is_empty() {
    return Err(SchemaError::EmptyLevel { level_id }.into());
  }

  let mut thread_ids = HashSet::new();
  let mut threads = Vec::with_capacity(def.threads.len());
  for thread_def in def.threads {
    if !thread_ids.insert(thread_def.thread_id.clone()) {
      return Err(
        SchemaError::DuplicateThreadId {
          level_id,
          thread_id: thread_def.thread_id,
        }
        .into(),
      );
    }
    threads.push(lock_thread(level_id, thread_def)?);
  }

  Ok(Level { level_id, threads })
}

fn lock_thread(level_id: i64, def: ThreadDef) -> Result<Thread, ResolveError> {
  if def.steps.is_empty() {
    return Err(
      SchemaError::EmptyThread {
        level_id,
        thread_id: def.thread_id,
      }
      .into(),
    );
  }

  let steps = def
    .steps
    .into_iter()
    .map(lock_step)
    .collect::<Result<Vec<_>, _>>()?;

  Ok(Thread {
    thread_id: def.thread_id,
    steps,
  })
}

fn lock_step(def: StepDef) -> Result<Step, ResolveError> {
  let kind = match def.step_type {
    StepType::Sync {
      function_name,
      call,
    } => StepKind::Sync {
      function_name,
      call: lock_call(call),
    },
    StepType::Async {
      function_id_name,
      function_status_name,
      wait_time_seconds,
      async_timeout_loop_in_minutes,
      call,
    } => StepKind::Async {
      function_id_name,
      function_status_name,
      wait_time_seconds,
      async_timeout_minutes: async_timeout_loop_in_minutes,
      call: lock_call(call),
    },
    StepType::Unload {
      function_name,
      call,
    } => StepKind::Unload {
      function_name,
      call: lock_call(call),
    },
    StepType::Workflows {
      workflows_name,
      call,
    } => StepKind::Workflows {
      workflows_name,
      call: lock_call(call),
    },
    StepType::BooleanChoice {
      read_input_from,
      true_job,
      false_job,
    } => {
      let on_true = true_job.ok_or_else(|| ResolveError::MissingBranchTarget {
        step_id: def.job_id.clone(),
        branch: ReferenceField::TrueJob,
      })?;
      let on_false = false_job.ok_or_else(|| ResolveError::MissingBranchTarget {
        step_id: def.job_id.clone(),
        branch: ReferenceField::FalseJob,
      })?;
      let source = read_input_from.ok_or_else(|| SchemaError::MissingBranchSource {
        step_id: def.job_id.clone(),
      })?;
      StepKind::BooleanChoice(Branch {
        source,
        on_true,
        on_false,
      })
    }
  };

  Ok(Step {
    step_id: def.job_id,
    name: def.job_name,
    kind,
  })
}

fn lock_call(options: CallOptions) -> Call {
  Call {
    continue_if_fail: options.continue_if_fail(),
    next: options.next,
    read_input_from: options.read_input_from,
    timeout_seconds: options.timeout_seconds,
    result_variable: options.result_variable_name,
  }
}

fn parse_level_id(raw: &str) -> Result<i64, SchemaError> {
  raw
    .trim()
    .parse::<i64>()
    .map_err(|_| SchemaError::InvalidLevelId {
      level_id: raw.to_string(),
    })
}

/// Check that every step id mentioned by a step exists in the workflow.
pub fn validate_references(index: &StepIndex<'_>) -> Result<(), ResolveError> {
  for step in index.workflow().steps() {
    for (field, target) in references(step) {
      if !index.contains(target) {
        return Err(ResolveError::UnresolvedReference {
          step_id: step.step_id.clone(),
          field,
          target: target.to_string(),
        });
      }
    }
  }
  Ok(())
}

fn references(step: &Step) -> Vec<(ReferenceField, &str)> {
  match &step.kind {
    StepKind::BooleanChoice(branch) => vec![
      (ReferenceField::ReadInputFrom, branch.source.as_str()),
      (ReferenceField::TrueJob, branch.on_true.as_str()),
      (ReferenceField::FalseJob, branch.on_false.as_str()),
    ],
    kind => kind
      .call()
      .and_then(|call| call.next.as_deref())
      .map(|next| vec![(ReferenceField::Next, next)])
      .unwrap_or_default(),
  }
}
