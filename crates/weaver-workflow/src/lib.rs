//! Weaver Workflow
//!
//! This crate provides the "locked" pipeline representation for Weaver.
//! A locked workflow is the validated, strongly typed form of a
//! `weaver-config` definition, ready to be linked and rendered.
//!
//! Key differences from `weaver-config`:
//! - Level ids are parsed integers
//! - Steps are tagged variants carrying only the fields they use
//! - Boolean-choice branch targets are guaranteed present
//! - Steps can be looked up workflow-wide through a [`StepIndex`]
//!
//! The [`LinkTable`] produced by the resolver lives here too, so renderers
//! depend on this crate only.

mod error;
mod graph;
mod index;
mod link;
mod step;
mod workflow;

pub use error::WorkflowError;
pub use graph::LinkGraph;
pub use index::{StepIndex, StepPosition};
pub use link::{BranchSource, Link, LinkTable, LinkedWorkflow, Successor};
pub use step::{Branch, Call, Step, StepKind};
pub use workflow::{Level, Thread, Workflow};
