//! Execution events and notifiers for observability.
//!
//! Events are emitted in the causal order steps actually execute - never
//! reordered or buffered out of sequence - so a consumer streaming them can
//! reconstruct progress exactly.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
  },

  /// A step has started executing.
  StepStarted {
    execution_id: String,
    step_id: String,
    skill: String,
  },

  /// A step has completed successfully.
  StepCompleted {
    execution_id: String,
    step_id: String,
    output: serde_json::Value,
  },

  /// A step has failed (after exhausting its retries).
  StepFailed {
    execution_id: String,
    step_id: String,
    error: String,
  },

  /// A step will never run.
  StepSkipped {
    execution_id: String,
    step_id: String,
    reason: String,
  },

  /// Workflow execution has finished, possibly with failed steps.
  WorkflowCompleted {
    execution_id: String,
    context: serde_json::Value,
  },

  /// Workflow execution ended with a fatal error.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event - implementations decide what
/// to do with them (persist, broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
///
/// Useful for tests or when event observation is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {
    // Intentionally empty
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Use this when you need to consume events asynchronously (e.g., stream
/// them onto a wire protocol). The channel is unbounded so a slow consumer
/// never stalls the scheduler; event volume is low (a handful per step).
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
