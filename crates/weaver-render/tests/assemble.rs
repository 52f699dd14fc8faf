//! End-to-end tests: definition JSON to written artifact.

use serde_json::json;
use weaver_config::{ExecConfig, WorkflowDef};
use weaver_render::{Assembler, Layout, RenderError, TemplateRenderer};
use weaver_resolver::{Resolver, StandardResolver};

fn pipeline() -> WorkflowDef {
  serde_json::from_value(json!([
    { "LEVEL_ID": "1", "THREADS": [
      { "THREAD_ID": "1", "STEPS": [
        { "JOB_ID": "J1", "JOB_NAME": "extract", "TYPE": "async",
          "FUNCTION_ID_NAME": "start_extract", "FUNCTION_STATUS_NAME": "poll_extract",
          "WAIT_TIME_SECONDS": "10", "RESULT_VARIABLE_NAME": "extracted" },
        { "JOB_ID": "J2", "JOB_NAME": "check", "TYPE": "boolean_choice",
          "READ_INPUT_FROM": "J1", "TRUE_JOB": "J3", "FALSE_JOB": "J4" }
      ]}
    ]},
    { "LEVEL_ID": "2", "THREADS": [
      { "THREAD_ID": "1", "STEPS": [
        { "JOB_ID": "J3", "JOB_NAME": "load", "TYPE": "sync", "FUNCTION_NAME": "load_fn" }
      ]},
      { "THREAD_ID": "2", "STEPS": [
        { "JOB_ID": "J4", "JOB_NAME": "notify", "TYPE": "workflows", "workflows_name": "alerts",
          "CONTINUE_IF_FAIL": "true" }
      ]}
    ]},
    { "LEVEL_ID": "3", "THREADS": [
      { "THREAD_ID": "7", "STEPS": [
        { "JOB_ID": "J5", "JOB_NAME": "cleanup", "TYPE": "unload" }
      ]}
    ]}
  ]))
  .unwrap()
}

fn params() -> ExecConfig {
  serde_json::from_value(json!({ "environment": "dev" })).unwrap()
}

fn renderer() -> TemplateRenderer {
  TemplateRenderer::from_sources([
    (
      "workflow",
      "# env={{ config.environment }}\n{{ levels }}# chain: {{ level_chain | join(' -> ') }}\n",
    ),
    ("level", "{{ symbol }} [{{ thread_symbols | join(', ') }}]\n{{ threads }}"),
    ("thread", "            {{ symbol }} from {{ starting_step }}\n{{ steps }}"),
    (
      "async",
      "              {{ symbol }} ids={{ async_job_id_variable }} next={{ next }}\n",
    ),
    (
      "boolean_choice",
      "              {{ symbol }} if {{ source }}.{{ result_variable }} then {{ next_true }} else {{ next_false }}\n",
    ),
    (
      "sync",
      "              {{ symbol }} call={{ function_name }} input={{ read_input_from }} next={{ next }}\n",
    ),
    (
      "workflows",
      "              {{ symbol }} run={{ workflows_name }} tolerant={{ continue_if_fail }} next={{ next }}\n",
    ),
    (
      "unload",
      "              {{ symbol }} fn={{ function_name }} next={{ next }}\n",
    ),
  ])
  .unwrap()
}

#[test]
fn test_generate_workflows_layout() {
  let linked = StandardResolver::new().resolve(pipeline()).unwrap();
  let renderer = renderer();

  let artifact = Assembler::new(&renderer, Layout::workflows(), params())
    .assemble(&linked)
    .unwrap();

  let expected = "\
# env=dev
Level_1_Thread_1 from J1_extract
  J1_extract ids=J1_async_job_id next=J2_check
  J2_check if J1_extract.extracted then J3_load else J4_notify
Level_2 [Level_2_Thread_1, Level_2_Thread_2]
            Level_2_Thread_1 from J3_load
              J3_load call=load_fn input=ENV next=continue
            Level_2_Thread_2 from J4_notify
              J4_notify run=alerts tolerant=true next=continue
Level_3_Thread_7 from J5_cleanup
  J5_cleanup fn= next=end
# chain: Level_1 -> Level_2 -> Level_3
";
  assert_eq!(artifact.as_str(), expected);
}

#[test]
fn test_composer_layout_wraps_every_level() {
  let linked = StandardResolver::new().resolve(pipeline()).unwrap();
  let renderer = renderer();

  let artifact = Assembler::new(&renderer, Layout::composer(), params())
    .assemble(&linked)
    .unwrap();

  assert!(artifact.as_str().contains("Level_1 [Level_1_Thread_1]\n"));
  assert!(artifact.as_str().contains("Level_3 [Level_3_Thread_7]\n"));
  assert!(
    artifact
      .as_str()
      .contains("              J1_extract ids=J1_async_job_id next=J2_check\n")
  );
}

#[test]
fn test_missing_step_template_fails_before_writing() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("pipeline.yaml");
  let linked = StandardResolver::new().resolve(pipeline()).unwrap();
  let renderer = TemplateRenderer::from_sources([
    ("workflow", "{{ levels }}"),
    ("level", "{{ threads }}"),
    ("thread", "{{ steps }}"),
  ])
  .unwrap();

  let result = Assembler::new(&renderer, Layout::workflows(), params()).assemble(&linked);

  assert!(matches!(
    result,
    Err(RenderError::TemplateNotFound { ref name }) if name == "async"
  ));
  assert!(!output.exists());
}

#[test]
fn test_written_artifact_matches_rendered_text() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("pipeline.yaml");
  let linked = StandardResolver::new().resolve(pipeline()).unwrap();
  let renderer = renderer();

  let artifact = Assembler::new(&renderer, Layout::workflows(), params())
    .assemble(&linked)
    .unwrap();
  artifact.write_to(&output).unwrap();

  assert_eq!(std::fs::read_to_string(&output).unwrap(), artifact.to_string());
}
