//! Weaver Config
//!
//! This crate contains the serializable pipeline definition types for Weaver.
//! These types mirror the JSON documents users write, before they are
//! validated and linked by the resolver.
//!
//! A pipeline definition is a JSON array of levels:
//! - each level holds threads that run in parallel
//! - each thread holds steps that run in sequence
//!
//! Execution parameters live in a separate flat JSON object ([`ExecConfig`])
//! that is handed to templates verbatim.

mod level;
mod params;
mod step;
mod workflow;

pub use level::{LevelDef, ThreadDef};
pub use params::ExecConfig;
pub use step::{CallOptions, StepDef, StepType};
pub use workflow::WorkflowDef;
