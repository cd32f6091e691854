//! Skillflow Workflow
//!
//! This crate provides the validated workflow representation for skillflow.
//! A `Workflow` is built from a parsed `WorkflowDef` and is immutable for
//! the duration of a run.
//!
//! Key responsibilities:
//! - Structural validation (duplicate ids, dangling dependencies, cycles,
//!   bad timeout/retry values), collected without short-circuiting
//! - Dependency graph views (upstream/downstream adjacency)
//! - Topological ordering via Kahn's algorithm
//! - Readiness queries for the scheduler
//! - Dry-run execution plans with parallel grouping

mod graph;
mod plan;
mod validate;
mod workflow;

pub use graph::Graph;
pub use plan::ExecutionPlan;
pub use validate::{ValidationIssue, ValidationReport};
pub use workflow::{Workflow, WorkflowStep};
