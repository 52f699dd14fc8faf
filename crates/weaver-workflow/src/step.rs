use serde::{Deserialize, Serialize};

/// A validated step in a locked workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub step_id: String,
  pub name: String,
  pub kind: StepKind,
}

impl Step {
  /// Rendered identifier of this step, `<id>_<name>`.
  pub fn symbol(&self) -> String {
    format!("{}_{}", self.step_id, self.name)
  }

  /// Explicit `NEXT` of an invocation step.
  pub fn explicit_next(&self) -> Option<&str> {
    self.kind.call().and_then(|call| call.next.as_deref())
  }

  /// Result variable exposed to boolean-choice steps, if any.
  pub fn result_variable(&self) -> Option<&str> {
    self
      .kind
      .call()
      .and_then(|call| call.result_variable.as_deref())
  }
}

/// The type of a locked step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
  Sync {
    function_name: String,
    call: Call,
  },
  Async {
    function_id_name: String,
    function_status_name: String,
    wait_time_seconds: String,
    async_timeout_minutes: Option<String>,
    call: Call,
  },
  Unload {
    function_name: Option<String>,
    call: Call,
  },
  Workflows {
    workflows_name: String,
    call: Call,
  },
  BooleanChoice(Branch),
}

impl StepKind {
  pub fn tag(&self) -> &'static str {
    match self {
      StepKind::Sync { .. } => "sync",
      StepKind::Async { .. } => "async",
      StepKind::Unload { .. } => "unload",
      StepKind::Workflows { .. } => "workflows",
      StepKind::BooleanChoice(_) => "boolean_choice",
    }
  }

  pub fn call(&self) -> Option<&Call> {
    match self {
      StepKind::Sync { call, .. }
      | StepKind::Async { call, .. }
      | StepKind::Unload { call, .. }
      | StepKind::Workflows { call, .. } => Some(call),
      StepKind::BooleanChoice(_) => None,
    }
  }

  pub fn branch(&self) -> Option<&Branch> {
    match self {
      StepKind::BooleanChoice(branch) => Some(branch),
      _ => None,
    }
  }
}

/// Call options shared by invocation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Call {
  pub next: Option<String>,
  pub read_input_from: Option<String>,
  pub timeout_seconds: Option<String>,
  pub continue_if_fail: bool,
  pub result_variable: Option<String>,
}

/// Branch targets of a boolean-choice step. All three are step ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
  pub source: String,
  pub on_true: String,
  pub on_false: String,
}
