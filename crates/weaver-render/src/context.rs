//! Typed context records handed to templates.
//!
//! Every optional attribute is serialized as `null` when absent. Templates
//! test it with `{% if timeout_seconds %}`; printed directly it renders as an
//! empty string, never as a placeholder word.

use serde::Serialize;
use weaver_config::ExecConfig;
use weaver_workflow::{Link, Step, StepKind};

/// Input source used when an invocation step does not declare one.
pub const DEFAULT_INPUT_SOURCE: &str = "ENV";

#[derive(Debug, Serialize)]
pub struct StepContext<'a> {
  pub symbol: String,
  pub step_id: &'a str,
  pub name: &'a str,
  pub step_type: &'static str,
  pub level_id: i64,
  pub thread_id: &'a str,

  /// Successor of an invocation step.
  pub next: Option<String>,
  /// Successors of a boolean choice.
  pub next_true: Option<String>,
  pub next_false: Option<String>,
  /// Symbol of the step a boolean choice inspects.
  pub source: Option<String>,
  /// The step's own result variable, or for a boolean choice the one it
  /// inspects.
  pub result_variable: Option<String>,

  pub function_name: Option<&'a str>,
  pub function_id_name: Option<&'a str>,
  pub function_status_name: Option<&'a str>,
  pub wait_time_seconds: Option<&'a str>,
  pub async_timeout_minutes: Option<&'a str>,
  pub timeout_seconds: Option<&'a str>,
  pub read_input_from: &'a str,
  pub continue_if_fail: bool,
  pub workflows_name: Option<&'a str>,
  pub async_job_id_variable: String,
  pub async_job_status_variable: String,

  pub config: &'a ExecConfig,
}

impl<'a> StepContext<'a> {
  pub fn new(
    step: &'a Step,
    link: &Link,
    level_id: i64,
    thread_id: &'a str,
    config: &'a ExecConfig,
  ) -> Self {
    let mut ctx = StepContext {
      symbol: step.symbol(),
      step_id: &step.step_id,
      name: &step.name,
      step_type: step.kind.tag(),
      level_id,
      thread_id,
      next: None,
      next_true: None,
      next_false: None,
      source: None,
      result_variable: None,
      function_name: None,
      function_id_name: None,
      function_status_name: None,
      wait_time_seconds: None,
      async_timeout_minutes: None,
      timeout_seconds: None,
      read_input_from: DEFAULT_INPUT_SOURCE,
      continue_if_fail: false,
      workflows_name: None,
      async_job_id_variable: format!("{}_async_job_id", step.step_id),
      async_job_status_variable: format!("{}_async_job_status", step.step_id),
      config,
    };

    match link {
      Link::Next(successor) => {
        ctx.next = Some(successor.symbol());
        ctx.result_variable = step.result_variable().map(str::to_string);
      }
      Link::Branch {
        on_true,
        on_false,
        source,
      } => {
        ctx.next_true = Some(on_true.symbol());
        ctx.next_false = Some(on_false.symbol());
        ctx.source = Some(source.symbol.clone());
        ctx.result_variable = source.result_variable.clone();
      }
    }

    if let Some(call) = step.kind.call() {
      ctx.timeout_seconds = call.timeout_seconds.as_deref();
      ctx.continue_if_fail = call.continue_if_fail;
      if let Some(input) = call.read_input_from.as_deref() {
        ctx.read_input_from = input;
      }
    }

    match &step.kind {
      StepKind::Sync { function_name, .. } => ctx.function_name = Some(function_name),
      StepKind::Async {
        function_id_name,
        function_status_name,
        wait_time_seconds,
        async_timeout_minutes,
        ..
      } => {
        ctx.function_id_name = Some(function_id_name);
        ctx.function_status_name = Some(function_status_name);
        ctx.wait_time_seconds = Some(wait_time_seconds);
        ctx.async_timeout_minutes = async_timeout_minutes.as_deref();
      }
      StepKind::Unload { function_name, .. } => ctx.function_name = function_name.as_deref(),
      StepKind::Workflows { workflows_name, .. } => ctx.workflows_name = Some(workflows_name),
      StepKind::BooleanChoice(branch) => ctx.read_input_from = &branch.source,
    }

    ctx
  }
}

#[derive(Debug, Serialize)]
pub struct ThreadContext<'a> {
  pub symbol: String,
  pub level_id: i64,
  pub thread_id: &'a str,
  /// Symbol of the first step.
  pub starting_step: String,
  /// Rendered step fragments, concatenated.
  pub steps: String,
  /// Step symbols in thread order.
  pub step_chain: Vec<String>,
  pub config: &'a ExecConfig,
}

#[derive(Debug, Serialize)]
pub struct LevelContext<'a> {
  pub symbol: String,
  pub level_id: i64,
  /// Rendered thread fragments, concatenated.
  pub threads: String,
  pub thread_symbols: Vec<String>,
  pub config: &'a ExecConfig,
}

#[derive(Debug, Serialize)]
pub struct WorkflowContext<'a> {
  /// Rendered level fragments, concatenated.
  pub levels: String,
  /// Level symbols in declared (execution) order.
  pub level_chain: Vec<String>,
  pub config: &'a ExecConfig,
}
