//! Fragment rendering using minijinja templates.
//!
//! A template set is a directory of files named `<template>.<extension>`:
//!
//! ```text
//! templates/workflows/
//! ├── workflow.yaml
//! ├── level.yaml
//! ├── thread.yaml
//! ├── async.yaml
//! └── boolean_choice.yaml
//! ```
//!
//! Only `workflow` is mandatory. A missing step or container template is
//! reported when something actually needs it, so a set for a pipeline that
//! only uses `async` steps does not have to ship a `sync` template.
//!
//! Output values are formatted for artifact text: an
//! absent optional (`none`) prints as nothing and booleans print as
//! `true` / `false`.

use std::fmt::Write;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, ErrorKind, Output, State, UndefinedBehavior, escape_formatter};
use serde::Serialize;
use tracing::debug;

use crate::context::{LevelContext, StepContext, ThreadContext, WorkflowContext};
use crate::error::RenderError;

/// Every template name a set may provide.
pub const TEMPLATE_NAMES: &[&str] = &[
  "workflow",
  "level",
  "thread",
  "sync",
  "async",
  "unload",
  "boolean_choice",
  "workflows",
];

/// Produces text fragments from typed contexts.
///
/// The assembler never inspects the fragments it gets back.
pub trait Renderer {
  fn render_step(&self, ctx: &StepContext<'_>) -> Result<String, RenderError>;
  fn render_thread(&self, ctx: &ThreadContext<'_>) -> Result<String, RenderError>;
  fn render_level(&self, ctx: &LevelContext<'_>) -> Result<String, RenderError>;
  fn render_workflow(&self, ctx: &WorkflowContext<'_>) -> Result<String, RenderError>;
}

/// Renderer backed by a minijinja environment.
pub struct TemplateRenderer {
  env: Environment<'static>,
}

impl TemplateRenderer {
  /// Load every known template `<name>.<extension>` found in `dir`.
  pub fn from_dir(dir: &Path, extension: &str) -> Result<Self, RenderError> {
    let mut sources = Vec::new();

    for name in TEMPLATE_NAMES {
      let path = dir.join(format!("{}.{}", name, extension));
      match std::fs::read_to_string(&path) {
        Ok(source) => {
          debug!(template = name, path = %path.display(), "template_loaded");
          sources.push((name.to_string(), source));
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(source) => {
          return Err(RenderError::Load {
            name: name.to_string(),
            path,
            source,
          });
        }
      }
    }

    Self::from_sources(sources)
  }

  /// Build a renderer from in-memory `(name, source)` pairs.
  pub fn from_sources<I, N, S>(sources: I) -> Result<Self, RenderError>
  where
    I: IntoIterator<Item = (N, S)>,
    N: Into<String>,
    S: Into<String>,
  {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_formatter(format_value);

    for (name, source) in sources {
      let name = name.into();
      env
        .add_template_owned(name.clone(), source.into())
        .map_err(|source| RenderError::Template { name, source })?;
    }

    if env.get_template("workflow").is_err() {
      return Err(RenderError::TemplateNotFound {
        name: "workflow".to_string(),
      });
    }

    Ok(Self { env })
  }

  /// Check whether a template with this name was loaded.
  pub fn has_template(&self, name: &str) -> bool {
    self.env.get_template(name).is_ok()
  }

  fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
    let template = self.env.get_template(name).map_err(|e| match e.kind() {
      ErrorKind::TemplateNotFound => RenderError::TemplateNotFound {
        name: name.to_string(),
      },
      _ => RenderError::Template {
        name: name.to_string(),
        source: e,
      },
    })?;

    template.render(ctx).map_err(|source| RenderError::Template {
      name: name.to_string(),
      source,
    })
  }
}

fn format_value(
  out: &mut Output<'_>,
  state: &State<'_, '_>,
  value: &Value,
) -> Result<(), minijinja::Error> {
  match value.kind() {
    ValueKind::None => Ok(()),
    ValueKind::Bool => {
      out.write_str(if value.is_true() { "true" } else { "false" })?;
      Ok(())
    }
    _ => escape_formatter(out, state, value),
  }
}

impl Renderer for TemplateRenderer {
  fn render_step(&self, ctx: &StepContext<'_>) -> Result<String, RenderError> {
    self.render(ctx.step_type, ctx)
  }

  fn render_thread(&self, ctx: &ThreadContext<'_>) -> Result<String, RenderError> {
    self.render("thread", ctx)
  }

  fn render_level(&self, ctx: &LevelContext<'_>) -> Result<String, RenderError> {
    self.render("level", ctx)
  }

  fn render_workflow(&self, ctx: &WorkflowContext<'_>) -> Result<String, RenderError> {
    self.render("workflow", ctx)
  }
}
