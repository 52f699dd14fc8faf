//! Render error types.

use std::path::PathBuf;

/// Errors that can occur while rendering or writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
  /// No template registered under this name.
  #[error("template not found: {name}")]
  TemplateNotFound { name: String },

  /// Template failed to compile or render.
  #[error("failed to render template '{name}': {source}")]
  Template {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  /// Template file could not be read.
  #[error("failed to load template '{name}' from {}: {source}", path.display())]
  Load {
    name: String,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A step has no entry in the link table.
  #[error("no resolved link for step '{step_id}'")]
  MissingLink { step_id: String },

  /// The artifact could not be persisted.
  #[error("failed to write artifact to {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
