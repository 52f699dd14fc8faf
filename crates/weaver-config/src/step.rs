use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StepDef {
  /// Unique across the whole workflow, not just the thread.
  pub job_id: String,
  pub job_name: String,
  #[serde(flatten)]
  pub step_type: StepType,
}

impl StepDef {
  /// Explicit successor, if this is an invocation step that declares one.
  pub fn next(&self) -> Option<&str> {
    self.step_type.call().and_then(|call| call.next.as_deref())
  }
}

/// Options shared by every invocation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CallOptions {
  /// Explicit successor step id. Overrides positional linking.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  /// Free-form input source, "ENV" when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub read_input_from: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<String>,
  /// Presence enables the flag; only an explicit `false` disables it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub continue_if_fail: Option<Value>,
  /// Variable a later `boolean_choice` step can inspect.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result_variable_name: Option<String>,
}

impl CallOptions {
  pub fn continue_if_fail(&self) -> bool {
    match &self.continue_if_fail {
      None => false,
      Some(Value::Bool(flag)) => *flag,
      Some(Value::String(s)) => !s.eq_ignore_ascii_case("false"),
      Some(_) => true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
  tag = "TYPE",
  rename_all = "snake_case",
  rename_all_fields = "SCREAMING_SNAKE_CASE"
)]
pub enum StepType {
  /// A blocking function call.
  Sync {
    function_name: String,
    #[serde(flatten)]
    call: CallOptions,
  },
  /// A start call followed by a status polling loop.
  Async {
    function_id_name: String,
    function_status_name: String,
    wait_time_seconds: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    async_timeout_loop_in_minutes: Option<String>,
    #[serde(flatten)]
    call: CallOptions,
  },
  Unload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_name: Option<String>,
    #[serde(flatten)]
    call: CallOptions,
  },
  /// Branches on the result of an earlier step.
  BooleanChoice {
    /// Id of the step whose result is inspected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_input_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    true_job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    false_job: Option<String>,
  },
  /// Invokes another deployed workflow.
  Workflows {
    #[serde(rename = "workflows_name", alias = "WORKFLOWS_NAME")]
    workflows_name: String,
    #[serde(flatten)]
    call: CallOptions,
  },
}

impl StepType {
  /// The type tag as it appears in the definition file.
  pub fn tag(&self) -> &'static str {
    match self {
      StepType::Sync { .. } => "sync",
      StepType::Async { .. } => "async",
      StepType::Unload { .. } => "unload",
      StepType::BooleanChoice { .. } => "boolean_choice",
      StepType::Workflows { .. } => "workflows",
    }
  }

  /// Call options for invocation steps, `None` for boolean choices.
  pub fn call(&self) -> Option<&CallOptions> {
    match self {
      StepType::Sync { call, .. }
      | StepType::Async { call, .. }
      | StepType::Unload { call, .. }
      | StepType::Workflows { call, .. } => Some(call),
      StepType::BooleanChoice { .. } => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_boolean_choice() {
    let step: StepDef = serde_json::from_value(json!({
      "JOB_ID": "J3",
      "JOB_NAME": "check",
      "TYPE": "boolean_choice",
      "READ_INPUT_FROM": "J2",
      "TRUE_JOB": "J4",
      "FALSE_JOB": "J5"
    }))
    .unwrap();

    assert_eq!(step.step_type.tag(), "boolean_choice");
    assert_eq!(step.next(), None);
    match step.step_type {
      StepType::BooleanChoice {
        read_input_from,
        true_job,
        false_job,
      } => {
        assert_eq!(read_input_from.as_deref(), Some("J2"));
        assert_eq!(true_job.as_deref(), Some("J4"));
        assert_eq!(false_job.as_deref(), Some("J5"));
      }
      other => panic!("expected boolean_choice, got {:?}", other),
    }
  }

  #[test]
  fn test_boolean_choice_targets_are_optional_at_parse_time() {
    let step: StepDef = serde_json::from_value(json!({
      "JOB_ID": "J3",
      "JOB_NAME": "check",
      "TYPE": "boolean_choice",
      "TRUE_JOB": "J4"
    }))
    .unwrap();

    assert!(matches!(
      step.step_type,
      StepType::BooleanChoice {
        false_job: None,
        ..
      }
    ));
  }

  #[test]
  fn test_parse_workflows_lowercase_name() {
    let step: StepDef = serde_json::from_value(json!({
      "JOB_ID": "J7",
      "JOB_NAME": "child",
      "TYPE": "workflows",
      "workflows_name": "nightly-child",
      "NEXT": "J1"
    }))
    .unwrap();

    assert_eq!(step.next(), Some("J1"));
    assert!(matches!(
      step.step_type,
      StepType::Workflows { ref workflows_name, .. } if workflows_name == "nightly-child"
    ));
  }

  #[test]
  fn test_unknown_type_is_rejected() {
    let result: Result<StepDef, _> = serde_json::from_value(json!({
      "JOB_ID": "J1",
      "JOB_NAME": "x",
      "TYPE": "teleport"
    }));
    assert!(result.is_err());
  }

  #[test]
  fn test_continue_if_fail_presence() {
    let mut call = CallOptions::default();
    assert!(!call.continue_if_fail());

    call.continue_if_fail = Some(json!("yes"));
    assert!(call.continue_if_fail());

    call.continue_if_fail = Some(json!("False"));
    assert!(!call.continue_if_fail());

    call.continue_if_fail = Some(json!(false));
    assert!(!call.continue_if_fail());
  }
}
