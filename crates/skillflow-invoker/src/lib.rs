//! Skillflow Invoker
//!
//! This crate wraps the external skill-invocation contract with the four
//! orthogonal behaviors the engine needs:
//! - metrics collection per skill
//! - retry with backoff
//! - result caching with TTL
//! - per-call timeout enforcement
//!
//! The engine only ever sees the [`SkillInvoker`] trait ("invoke skill S
//! with input I, get back a result or a failure"); how a skill is resolved
//! or implemented is someone else's problem. [`SkillExecutor`] composes the
//! behaviors above around any invoker.

mod cache;
mod error;
mod executor;
mod invoker;
mod metrics;

pub use cache::ResultCache;
pub use error::SkillError;
pub use executor::{ExecutorConfig, InvokeOptions, ParallelBatch, SkillExecutor};
pub use invoker::{RegistryInvoker, SkillHandler, SkillInvoker};
pub use metrics::{MetricsRegistry, SkillMetrics};
