use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use weaver_config::ExecConfig;
use weaver_workflow::{Level, LinkedWorkflow, Thread};

use crate::context::{LevelContext, StepContext, ThreadContext, WorkflowContext};
use crate::error::RenderError;
use crate::template::Renderer;

/// Target-specific rendering shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  /// File extension of the template set.
  pub extension: String,
  /// Render single-thread levels without the level wrapper.
  pub collapse_single_thread: bool,
  /// Leading spaces removed from an unwrapped thread body.
  pub collapse_dedent: usize,
}

impl Layout {
  /// Workflow-engine documents nest threads inside a parallel branch block,
  /// so a lone thread is lifted out of it.
  pub fn workflows() -> Self {
    Self {
      extension: "yaml".to_string(),
      collapse_single_thread: true,
      collapse_dedent: 12,
    }
  }

  /// DAG scripts always wrap levels in a task group.
  pub fn composer() -> Self {
    Self {
      extension: "py".to_string(),
      collapse_single_thread: false,
      collapse_dedent: 0,
    }
  }

  fn collapses(&self, level: &Level) -> bool {
    self.collapse_single_thread && level.is_single_thread()
  }
}

/// Drives a [`Renderer`] over a linked workflow and joins the fragments.
pub struct Assembler<'r, R: Renderer> {
  renderer: &'r R,
  layout: Layout,
  config: ExecConfig,
}

impl<'r, R: Renderer> Assembler<'r, R> {
  pub fn new(renderer: &'r R, layout: Layout, config: ExecConfig) -> Self {
    Self {
      renderer,
      layout,
      config,
    }
  }

  /// Render the whole workflow into memory.
  #[instrument(name = "artifact_assemble", skip_all, fields(extension = %self.layout.extension))]
  pub fn assemble(&self, linked: &LinkedWorkflow) -> Result<Artifact, RenderError> {
    let mut levels = String::new();
    let mut level_chain = Vec::with_capacity(linked.workflow.levels.len());

    for level in &linked.workflow.levels {
      levels.push_str(&self.assemble_level(linked, level)?);
      level_chain.push(level.symbol());
    }

    let content = self.renderer.render_workflow(&WorkflowContext {
      levels,
      level_chain,
      config: &self.config,
    })?;

    info!(
      levels = linked.workflow.levels.len(),
      bytes = content.len(),
      "artifact_assembled"
    );

    Ok(Artifact { content })
  }

  fn assemble_level(&self, linked: &LinkedWorkflow, level: &Level) -> Result<String, RenderError> {
    let mut threads = String::new();
    let mut thread_symbols = Vec::with_capacity(level.threads.len());

    for thread in &level.threads {
      threads.push_str(&self.assemble_thread(linked, level.level_id, thread)?);
      thread_symbols.push(thread.symbol(level.level_id));
    }

    if self.layout.collapses(level) {
      debug!(level_id = level.level_id, "level_collapsed");
      return Ok(dedent(&threads, self.layout.collapse_dedent));
    }

    self.renderer.render_level(&LevelContext {
      symbol: level.symbol(),
      level_id: level.level_id,
      threads,
      thread_symbols,
      config: &self.config,
    })
  }

  fn assemble_thread(
    &self,
    linked: &LinkedWorkflow,
    level_id: i64,
    thread: &Thread,
  ) -> Result<String, RenderError> {
    let mut steps = String::new();
    let mut step_chain = Vec::with_capacity(thread.steps.len());

    for step in &thread.steps {
      let link = linked
        .link(&step.step_id)
        .ok_or_else(|| RenderError::MissingLink {
          step_id: step.step_id.clone(),
        })?;
      let ctx = StepContext::new(step, link, level_id, &thread.thread_id, &self.config);
      steps.push_str(&self.renderer.render_step(&ctx)?);
      step_chain.push(ctx.symbol);
    }

    let starting_step = step_chain.first().cloned().unwrap_or_default();

    self.renderer.render_thread(&ThreadContext {
      symbol: thread.symbol(level_id),
      level_id,
      thread_id: &thread.thread_id,
      starting_step,
      steps,
      step_chain,
      config: &self.config,
    })
  }
}

/// Remove up to `width` leading spaces from every line.
///
/// Lines indented by less than `width` lose only the spaces they have; tabs
/// and other characters are never removed.
pub fn dedent(text: &str, width: usize) -> String {
  if width == 0 {
    return text.to_string();
  }

  text
    .split_inclusive('\n')
    .map(|line| {
      let spaces = line.bytes().take(width).take_while(|b| *b == b' ').count();
      &line[spaces..]
    })
    .collect()
}

/// A fully rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  content: String,
}

impl Artifact {
  pub fn new(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.content
  }

  /// Write the artifact to `path`, replacing any existing file.
  ///
  /// Content goes to a temporary file next to `path` first and is renamed
  /// into place, so readers never observe a partial artifact.
  pub fn write_to(&self, path: &Path) -> Result<(), RenderError> {
    let tmp = temp_path(path);

    if let Err(source) = fs::write(&tmp, &self.content) {
      discard(&tmp);
      return Err(RenderError::Write {
        path: path.to_path_buf(),
        source,
      });
    }

    if let Err(source) = fs::rename(&tmp, path) {
      discard(&tmp);
      return Err(RenderError::Write {
        path: path.to_path_buf(),
        source,
      });
    }

    info!(path = %path.display(), bytes = self.content.len(), "artifact_written");
    Ok(())
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.content)
  }
}

fn temp_path(path: &Path) -> PathBuf {
  let name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "artifact".to_string());
  path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

fn discard(tmp: &Path) {
  if let Err(e) = fs::remove_file(tmp) {
    if e.kind() != std::io::ErrorKind::NotFound {
      warn!(path = %tmp.display(), error = %e, "temp_file_cleanup_failed");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::template::TemplateRenderer;
  use weaver_workflow::{Call, Link, LinkTable, Step, StepKind, Successor, Workflow};

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

  fn make_linked(levels: Vec<Level>, links: &[(&str, Successor)]) -> LinkedWorkflow {
    let mut table = LinkTable::new();
    for (id, successor) in links {
      table.insert(id.to_string(), Link::Next(successor.clone()));
    }
    LinkedWorkflow {
      workflow: Workflow { levels },
      links: table,
    }
  }

  fn renderer() -> TemplateRenderer {
    TemplateRenderer::from_sources([
      ("workflow", "main:\n{{ levels }}"),
      ("level", "  - {{ symbol }}:\n      parallel:\n{{ threads }}"),
      (
        "thread",
        "            - {{ symbol }}:\n                start: {{ starting_step }}\n{{ steps }}",
      ),
      (
        "sync",
        "                - {{ symbol }}: {{ function_name }} -> {{ next }}\n",
      ),
    ])
    .unwrap()
  }

  #[test]
  fn test_dedent_strips_at_most_width_spaces() {
    let text = "            a\n              b\n   c\n\td\n";
    assert_eq!(dedent(text, 12), "a\n  b\nc\n\td\n");
    assert_eq!(dedent("  x", 0), "  x");
    assert_eq!(dedent("", 4), "");
  }

  #[test]
  fn test_single_thread_level_is_collapsed() {
    let linked = make_linked(
      vec![Level {
        level_id: 1,
        threads: vec![make_thread("1", &["A"])],
      }],
      &[("A", Successor::End)],
    );
    let renderer = renderer();

    let artifact = Assembler::new(&renderer, Layout::workflows(), ExecConfig::default())
      .assemble(&linked)
      .unwrap();

    assert_eq!(
      artifact.as_str(),
      "main:\n- Level_1_Thread_1:\n    start: A_job\n    - A_job: fn -> end\n"
    );
  }

  #[test]
  fn test_parallel_level_keeps_wrapper() {
    let linked = make_linked(
      vec![Level {
        level_id: 1,
        threads: vec![make_thread("1", &["A"]), make_thread("2", &["B"])],
      }],
      &[("A", Successor::Continue), ("B", Successor::Continue)],
    );
    let renderer = renderer();

    let artifact = Assembler::new(&renderer, Layout::workflows(), ExecConfig::default())
      .assemble(&linked)
      .unwrap();

    assert!(artifact.as_str().contains("  - Level_1:\n      parallel:\n"));
    assert!(artifact.as_str().contains("            - Level_1_Thread_2:\n"));
    assert!(artifact.as_str().contains("- B_job: fn -> continue\n"));
  }

  #[test]
  fn test_collapse_does_not_change_links() {
    let linked = make_linked(
      vec![Level {
        level_id: 1,
        threads: vec![make_thread("1", &["A", "B"])],
      }],
      &[
        (
          "A",
          Successor::Step {
            step_id: "B".to_string(),
            symbol: "B_job".to_string(),
          },
        ),
        ("B", Successor::End),
      ],
    );
    let renderer = renderer();

    let collapsed = Assembler::new(&renderer, Layout::workflows(), ExecConfig::default())
      .assemble(&linked)
      .unwrap();
    let wrapped = Assembler::new(&renderer, Layout::composer(), ExecConfig::default())
      .assemble(&linked)
      .unwrap();

    for artifact in [&collapsed, &wrapped] {
      assert!(artifact.as_str().contains("A_job: fn -> B_job\n"));
      assert!(artifact.as_str().contains("B_job: fn -> end\n"));
    }
    assert!(!collapsed.as_str().contains("parallel"));
    assert!(wrapped.as_str().contains("parallel"));
  }

  #[test]
  fn test_missing_link_is_an_error() {
    let linked = make_linked(
      vec![Level {
        level_id: 1,
        threads: vec![make_thread("1", &["A"])],
      }],
      &[],
    );
    let renderer = renderer();

    let result = Assembler::new(&renderer, Layout::composer(), ExecConfig::default()).assemble(&linked);

    assert!(matches!(
      result,
      Err(RenderError::MissingLink { ref step_id }) if step_id == "A"
    ));
  }

  #[test]
  fn test_write_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.yaml");
    fs::write(&path, "old").unwrap();

    Artifact::new("main: []\n").write_to(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "main: []\n");
    let leftovers: Vec<_> = fs::read_dir(dir.path())
      .unwrap()
      .filter_map(Result::ok)
      .filter(|entry| entry.file_name() != "out.yaml")
      .collect();
    assert!(leftovers.is_empty());
  }

  #[test]
  fn test_failed_write_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.yaml");

    let result = Artifact::new("content").write_to(&path);

    assert!(matches!(result, Err(RenderError::Write { .. })));
    assert!(!path.exists());
  }
}
