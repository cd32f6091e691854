//! The workflow engine: wave scheduling and failure policies.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use skillflow_config::OnFailure;
use skillflow_invoker::{InvokeOptions, SkillError, SkillExecutor, SkillInvoker};
use skillflow_workflow::{Workflow, WorkflowStep};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::context::WorkflowContext;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::ExecutionResult;

/// Configuration for the workflow engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Global budget for one run. `None` means no whole-workflow timeout.
  pub workflow_timeout: Option<Duration>,
  /// Dispatch the steps of a wave concurrently (the default) or serially.
  pub parallel: bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      workflow_timeout: None,
      parallel: true,
    }
  }
}

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `WorkflowEngine::new()` for a default engine with no-op
/// notifications, or `WorkflowEngine::with_notifier()` to observe events.
pub struct WorkflowEngine<I: SkillInvoker, N: ExecutionNotifier = NoopNotifier> {
  executor: Arc<SkillExecutor<I>>,
  config: EngineConfig,
  notifier: N,
}

/// Mutable bookkeeping for one run.
struct RunState {
  context: WorkflowContext,
  completed: HashSet<String>,
  failed: HashSet<String>,
  skipped: HashSet<String>,
  results: HashMap<String, Value>,
  errors: HashMap<String, String>,
  executed_steps: Vec<String>,
  failed_steps: Vec<String>,
  skipped_steps: Vec<String>,
}

impl RunState {
  fn new() -> Self {
    Self {
      context: WorkflowContext::new(),
      completed: HashSet::new(),
      failed: HashSet::new(),
      skipped: HashSet::new(),
      results: HashMap::new(),
      errors: HashMap::new(),
      executed_steps: Vec::new(),
      failed_steps: Vec::new(),
      skipped_steps: Vec::new(),
    }
  }

  fn is_settled(&self, step_id: &str) -> bool {
    self.completed.contains(step_id)
      || self.failed.contains(step_id)
      || self.skipped.contains(step_id)
  }

  fn settled_count(&self) -> usize {
    self.completed.len() + self.failed.len() + self.skipped.len()
  }

  /// Failed and skipped ids combined; from the readiness query's point of
  /// view both exclude a step from candidacy.
  fn blocked(&self) -> HashSet<String> {
    self.failed.union(&self.skipped).cloned().collect()
  }
}

enum WaveAbort {
  TimedOut,
  Cancelled,
}

impl<I: SkillInvoker> WorkflowEngine<I, NoopNotifier> {
  /// Create a new workflow engine with no-op notifications.
  pub fn new(executor: Arc<SkillExecutor<I>>) -> Self {
    Self::with_notifier(executor, EngineConfig::default(), NoopNotifier)
  }

  /// Create a new workflow engine with the given configuration.
  pub fn with_config(executor: Arc<SkillExecutor<I>>, config: EngineConfig) -> Self {
    Self::with_notifier(executor, config, NoopNotifier)
  }
}

impl<I: SkillInvoker, N: ExecutionNotifier> WorkflowEngine<I, N> {
  /// Create a new workflow engine with a custom notifier.
  pub fn with_notifier(executor: Arc<SkillExecutor<I>>, config: EngineConfig, notifier: N) -> Self {
    Self {
      executor,
      config,
      notifier,
    }
  }

  /// Execute a workflow to completion.
  ///
  /// Validation failures, deadlocks, whole-workflow timeouts and
  /// cancellation are returned as errors; every other run - including one
  /// with failed or skipped steps - yields an [`ExecutionResult`].
  #[instrument(
    name = "workflow_execute",
    skip(self, workflow, cancel),
    fields(workflow = %workflow.name)
  )]
  pub async fn execute(
    &self,
    workflow: &Workflow,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let report = workflow.validate();
    if !report.is_valid() {
      return Err(ExecutionError::Validation {
        issues: report.errors,
      });
    }

    let execution_id = uuid::Uuid::new_v4().to_string();
    let started = Instant::now();
    let deadline = self.config.workflow_timeout.map(|t| started + t);

    info!(
      execution_id = %execution_id,
      workflow = %workflow.name,
      version = %workflow.version,
      steps = workflow.steps.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow: workflow.name.clone(),
    });

    let mut state = RunState::new();
    let outcome = self
      .run_loop(workflow, &mut state, &execution_id, started, deadline, &cancel)
      .await;

    match outcome {
      Ok(()) => {
        let result = self.build_result(&execution_id, &state, started);
        info!(
          execution_id = %execution_id,
          success = result.success,
          executed = result.executed_steps.len(),
          failed = result.failed_steps.len(),
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.clone(),
          context: serde_json::to_value(&result.results).unwrap_or(Value::Null),
        });
        Ok(result)
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
        Err(e)
      }
    }
  }

  /// Run the main scheduling loop: waves of ready steps until every step is
  /// settled or a fatal condition aborts the run.
  async fn run_loop(
    &self,
    workflow: &Workflow,
    state: &mut RunState,
    execution_id: &str,
    started: Instant,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
  ) -> Result<(), ExecutionError> {
    loop {
      if cancel.is_cancelled() {
        return Err(ExecutionError::Cancelled);
      }

      let ready = workflow.next_steps(&state.completed, &state.blocked());
      if ready.is_empty() {
        if state.settled_count() == workflow.steps.len() {
          return Ok(());
        }
        // Work remains but nothing is ready. Steps blocked by a failed (or
        // already-skipped) dependency are permanently skipped; if none
        // qualify the graph itself is wedged.
        if self.skip_blocked_steps(workflow, state, execution_id) == 0 {
          let remaining: Vec<String> = workflow
            .steps
            .iter()
            .filter(|s| !state.is_settled(&s.id))
            .map(|s| s.id.clone())
            .collect();
          return Err(ExecutionError::Deadlock { remaining });
        }
        continue;
      }

      info!(execution_id = %execution_id, wave = ?ready, "dispatching wave");

      // Substitute templates against the context as it stands at the start
      // of the wave; sibling steps never observe each other's output.
      let context_value = state.context.to_value();
      let wave: Vec<(&WorkflowStep, Value)> = ready
        .iter()
        .map(|id| {
          let step = workflow.get_step(id).unwrap();
          let input = skillflow_template::substitute(&step.input, &context_value);
          (step, input)
        })
        .collect();

      for (step, _) in &wave {
        info!(execution_id = %execution_id, step_id = %step.id, skill = %step.skill, "step_started");
        self.notifier.notify(ExecutionEvent::StepStarted {
          execution_id: execution_id.to_string(),
          step_id: step.id.clone(),
          skill: step.skill.clone(),
        });
      }

      let results = match self.dispatch_wave(&wave, deadline, cancel).await {
        Ok(results) => results,
        Err(WaveAbort::TimedOut) => {
          warn!(execution_id = %execution_id, "workflow timed out mid-wave");
          let timeout_ms = self
            .config
            .workflow_timeout
            .map(|t| t.as_millis() as u64)
            .unwrap_or_default();
          let partial = self.build_result(execution_id, state, started);
          return Err(ExecutionError::Timeout {
            workflow: workflow.name.clone(),
            timeout_ms,
            partial: Box::new(partial),
          });
        }
        Err(WaveAbort::Cancelled) => {
          warn!(execution_id = %execution_id, "workflow cancelled mid-wave");
          return Err(ExecutionError::Cancelled);
        }
      };

      let mut stop_after: Option<String> = None;
      for ((step, _), outcome) in wave.iter().zip(results) {
        match outcome {
          Ok(output) => {
            info!(execution_id = %execution_id, step_id = %step.id, "step_completed");
            self.notifier.notify(ExecutionEvent::StepCompleted {
              execution_id: execution_id.to_string(),
              step_id: step.id.clone(),
              output: output.clone(),
            });
            state.context.insert(step.id.clone(), output.clone());
            state.results.insert(step.id.clone(), output);
            state.completed.insert(step.id.clone());
            state.executed_steps.push(step.id.clone());
          }
          Err(e) => {
            error!(execution_id = %execution_id, step_id = %step.id, error = %e, "step_failed");
            self.notifier.notify(ExecutionEvent::StepFailed {
              execution_id: execution_id.to_string(),
              step_id: step.id.clone(),
              error: e.to_string(),
            });
            state.errors.insert(step.id.clone(), e.to_string());
            state.failed.insert(step.id.clone());
            state.failed_steps.push(step.id.clone());
            if step.on_failure == OnFailure::Stop && stop_after.is_none() {
              stop_after = Some(step.id.clone());
            }
          }
        }
      }

      if let Some(failed_id) = stop_after {
        // Abort the run: no further waves; everything unsettled is skipped.
        let reason = format!("workflow stopped after failure of '{}'", failed_id);
        self.skip_remaining(workflow, state, execution_id, &reason);
        return Ok(());
      }
    }
  }

  /// Dispatch one wave, racing the whole-workflow deadline and cancellation.
  ///
  /// In-flight skill calls are dropped, not force-cancelled, when the race
  /// is lost; their results are discarded.
  async fn dispatch_wave(
    &self,
    wave: &[(&WorkflowStep, Value)],
    deadline: Option<Instant>,
    cancel: &CancellationToken,
  ) -> Result<Vec<Result<Value, SkillError>>, WaveAbort> {
    let run_all = async {
      let step_futures = wave.iter().map(|(step, input)| {
        let options = InvokeOptions {
          timeout: step.timeout(),
          retry: step.retry.clone(),
        };
        async move { self.executor.execute(&step.skill, input, &options).await }
      });

      if self.config.parallel {
        futures::future::join_all(step_futures).await
      } else {
        let mut results = Vec::with_capacity(wave.len());
        for future in step_futures {
          results.push(future.await);
        }
        results
      }
    };

    tokio::select! {
      results = run_all => Ok(results),
      _ = sleep_until_deadline(deadline) => Err(WaveAbort::TimedOut),
      _ = cancel.cancelled() => Err(WaveAbort::Cancelled),
    }
  }

  /// Skip every unsettled step blocked by a failed or skipped dependency,
  /// transitively. Returns how many steps were newly skipped.
  fn skip_blocked_steps(
    &self,
    workflow: &Workflow,
    state: &mut RunState,
    execution_id: &str,
  ) -> usize {
    let mut newly_skipped = 0;
    loop {
      let mut progressed = false;
      for step in &workflow.steps {
        if state.is_settled(&step.id) {
          continue;
        }
        let blocked_by = step
          .depends_on
          .iter()
          .find(|d| state.failed.contains(*d) || state.skipped.contains(*d));
        if let Some(dep) = blocked_by {
          let reason = format!("dependency '{}' did not complete", dep);
          self.skip_step(state, execution_id, &step.id, &reason);
          newly_skipped += 1;
          progressed = true;
        }
      }
      if !progressed {
        break;
      }
    }
    newly_skipped
  }

  /// Skip every unsettled step with the given reason, in declaration order.
  fn skip_remaining(
    &self,
    workflow: &Workflow,
    state: &mut RunState,
    execution_id: &str,
    reason: &str,
  ) {
    let unsettled: Vec<String> = workflow
      .steps
      .iter()
      .filter(|s| !state.is_settled(&s.id))
      .map(|s| s.id.clone())
      .collect();
    for step_id in unsettled {
      self.skip_step(state, execution_id, &step_id, reason);
    }
  }

  fn skip_step(&self, state: &mut RunState, execution_id: &str, step_id: &str, reason: &str) {
    info!(execution_id = %execution_id, step_id = %step_id, reason = %reason, "step_skipped");
    self.notifier.notify(ExecutionEvent::StepSkipped {
      execution_id: execution_id.to_string(),
      step_id: step_id.to_string(),
      reason: reason.to_string(),
    });
    state.skipped.insert(step_id.to_string());
    state.skipped_steps.push(step_id.to_string());
  }

  fn build_result(
    &self,
    execution_id: &str,
    state: &RunState,
    started: Instant,
  ) -> ExecutionResult {
    ExecutionResult {
      execution_id: execution_id.to_string(),
      success: state.errors.is_empty(),
      results: state.results.clone(),
      errors: state.errors.clone(),
      executed_steps: state.executed_steps.clone(),
      failed_steps: state.failed_steps.clone(),
      skipped_steps: state.skipped_steps.clone(),
      duration: started.elapsed(),
    }
  }

  /// The shared skill executor (cache and metrics live there).
  pub fn executor(&self) -> &Arc<SkillExecutor<I>> {
    &self.executor
  }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => tokio::time::sleep_until(deadline).await,
    None => std::future::pending::<()>().await,
  }
}
