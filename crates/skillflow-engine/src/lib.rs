//! Skillflow Engine
//!
//! The workflow execution engine. A `WorkflowEngine` drives a validated
//! workflow to completion: it repeatedly asks the workflow for the next
//! wave of ready steps, substitutes template tokens against the live
//! context, dispatches the wave through a `SkillExecutor`, and folds the
//! results back into the context until every step is accounted for or a
//! fatal stop condition is reached.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    WorkflowEngine                      │
//! │  - execute(workflow, cancel) → ExecutionResult         │
//! │  - wave scheduling, failure policies, deadlock checks  │
//! │  - emits lifecycle events via ExecutionNotifier        │
//! └────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌────────────────────────────────────────────────────────┐
//! │                    SkillExecutor                       │
//! │  - retry/backoff, caching, metrics, timeouts           │
//! └────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌────────────────────────────────────────────────────────┐
//! │                    SkillInvoker                        │
//! │  - invoke(skill, input) → result or failure            │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Waves are strictly sequential; steps within a wave are dispatched
//! together and awaited together, so a dependent step always observes its
//! dependencies' final context values.

mod context;
mod engine;
mod error;
mod events;
mod result;

pub use context::WorkflowContext;
pub use engine::{EngineConfig, WorkflowEngine};
pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::ExecutionResult;
