//! Weaver Render
//!
//! Turns a linked workflow into the final artifact text.
//!
//! - [`Renderer`] is the template collaborator: it receives typed context
//!   records and returns opaque fragments.
//! - [`Assembler`] walks the workflow, feeds the renderer, applies the
//!   single-thread collapse of the chosen [`Layout`] and joins fragments.
//! - [`Artifact`] holds the complete output and writes it in one step.

mod assemble;
mod context;
mod error;
mod template;

pub use assemble::{Artifact, Assembler, Layout, dedent};
pub use context::{LevelContext, StepContext, ThreadContext, WorkflowContext};
pub use error::RenderError;
pub use template::{Renderer, TEMPLATE_NAMES, TemplateRenderer};
