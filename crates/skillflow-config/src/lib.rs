//! Skillflow Config
//!
//! This crate provides the serializable workflow definition types for
//! skillflow. A `WorkflowDef` is the raw, textual form of a workflow as
//! submitted by a caller; it is parsed leniently (missing step ids are
//! synthesized) and then handed to `skillflow-workflow` for full
//! structural validation.

mod enums;
mod error;
mod step;
mod workflow;

pub use enums::{BackoffKind, OnFailure};
pub use error::ConfigError;
pub use step::{RetryDef, StepDef};
pub use workflow::WorkflowDef;
