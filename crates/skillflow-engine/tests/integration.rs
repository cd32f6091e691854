//! Integration tests for skillflow-engine using a scripted skill registry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use skillflow_config::WorkflowDef;
use skillflow_engine::{
  ChannelNotifier, EngineConfig, ExecutionError, ExecutionEvent, WorkflowEngine,
};
use skillflow_invoker::{RegistryInvoker, SkillError, SkillExecutor, SkillInvoker};
use skillflow_workflow::Workflow;
use tokio_util::sync::CancellationToken;

fn parse_workflow(value: Value) -> Workflow {
  Workflow::from_def(WorkflowDef::from_value(value).expect("workflow fixture parses"))
}

/// A registry with a research/summarize/report pipeline plus a failing skill.
fn pipeline_registry() -> RegistryInvoker {
  let mut registry = RegistryInvoker::new();
  registry.register("research", |input: &Value| {
    Ok(json!({ "topic": input["topic"], "findings": "three key facts" }))
  });
  registry.register("summarize", |input: &Value| {
    Ok(json!({ "summary": format!("summary of: {}", input["source"].as_str().unwrap_or("")) }))
  });
  registry.register("report", |input: &Value| {
    Ok(json!({ "report": input["body"] }))
  });
  registry.register("fail", |_: &Value| Err("deliberate failure".to_string()));
  registry.register("echo", |input: &Value| Ok(input.clone()));
  registry
}

fn engine_for(registry: RegistryInvoker) -> WorkflowEngine<RegistryInvoker> {
  WorkflowEngine::new(Arc::new(SkillExecutor::new(registry)))
}

#[tokio::test]
async fn pipeline_flows_context_between_steps() {
  let workflow = parse_workflow(json!({
    "name": "pipeline",
    "version": "1.0",
    "steps": [
      { "id": "research", "skill": "research", "input": { "topic": "rust" } },
      {
        "id": "summarize",
        "skill": "summarize",
        "input": { "source": "{{steps.research.findings}}" },
        "depends_on": ["research"]
      },
      {
        "id": "report",
        "skill": "report",
        "input": { "body": "{{steps.summarize.summary}}" },
        "depends_on": ["summarize"]
      }
    ]
  }));

  assert_eq!(
    workflow.execution_order(),
    vec!["research", "summarize", "report"]
  );

  let engine = engine_for(pipeline_registry());
  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();

  assert!(result.success);
  assert_eq!(
    result.executed_steps,
    vec!["research", "summarize", "report"]
  );
  assert_eq!(
    result.results["summarize"]["summary"],
    json!("summary of: three key facts")
  );
  assert_eq!(
    result.results["report"]["report"],
    json!("summary of: three key facts")
  );
}

#[tokio::test]
async fn invalid_workflow_is_rejected_before_any_side_effect() {
  let workflow = parse_workflow(json!({
    "name": "cyclic",
    "version": "1.0",
    "steps": [
      { "id": "a", "skill": "echo", "depends_on": ["b"] },
      { "id": "b", "skill": "echo", "depends_on": ["a"] }
    ]
  }));

  let engine = engine_for(pipeline_registry());
  let err = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(err, ExecutionError::Validation { .. }));
  assert!(engine.executor().metrics("echo").is_none());
}

#[tokio::test]
async fn stop_policy_skips_all_dependents() {
  let workflow = parse_workflow(json!({
    "name": "stop",
    "version": "1.0",
    "steps": [
      { "id": "boom", "skill": "fail", "on_failure": "stop" },
      { "id": "child", "skill": "echo", "depends_on": ["boom"] },
      { "id": "grandchild", "skill": "echo", "depends_on": ["child"] }
    ]
  }));

  let engine = engine_for(pipeline_registry());
  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();

  assert!(!result.success);
  assert_eq!(result.failed_steps, vec!["boom"]);
  assert_eq!(result.skipped_steps, vec!["child", "grandchild"]);
  assert!(result.errors.contains_key("boom"));
  assert!(result.results.is_empty());
}

#[tokio::test]
async fn continue_policy_lets_independent_siblings_run() {
  let workflow = parse_workflow(json!({
    "name": "continue",
    "version": "1.0",
    "steps": [
      { "id": "boom", "skill": "fail", "on_failure": "continue" },
      { "id": "sibling", "skill": "echo", "input": { "ok": true } },
      { "id": "child", "skill": "echo", "depends_on": ["boom"] }
    ]
  }));

  let engine = engine_for(pipeline_registry());
  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();

  assert!(!result.success);
  assert_eq!(result.executed_steps, vec!["sibling"]);
  assert_eq!(result.failed_steps, vec!["boom"]);
  // The dependent of the failed step can never acquire an input; it is
  // permanently skipped rather than run with a hole in its context.
  assert_eq!(result.skipped_steps, vec!["child"]);
  assert_eq!(result.errors["boom"], "skill 'fail' failed: deliberate failure");
}

#[tokio::test]
async fn steps_in_one_wave_run_concurrently() {
  struct SleepyInvoker;

  #[async_trait::async_trait]
  impl SkillInvoker for SleepyInvoker {
    async fn invoke(&self, skill: &str, _input: &Value) -> Result<Value, SkillError> {
      let ms = match skill {
        "slow" => 80,
        _ => 60,
      };
      tokio::time::sleep(Duration::from_millis(ms)).await;
      Ok(json!(ms))
    }
  }

  let workflow = parse_workflow(json!({
    "name": "parallel",
    "version": "1.0",
    "steps": [
      { "id": "a", "skill": "slow" },
      { "id": "b", "skill": "slower" }
    ]
  }));

  let engine = WorkflowEngine::new(Arc::new(SkillExecutor::new(SleepyInvoker)));
  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();

  assert!(result.success);
  // Close to max(80, 60), not 80 + 60.
  assert!(
    result.duration < Duration::from_millis(130),
    "wave took {:?}",
    result.duration
  );
}

#[tokio::test]
async fn workflow_timeout_ends_the_run_with_partial_results() {
  struct SlowSecondInvoker;

  #[async_trait::async_trait]
  impl SkillInvoker for SlowSecondInvoker {
    async fn invoke(&self, skill: &str, input: &Value) -> Result<Value, SkillError> {
      if skill == "glacial" {
        tokio::time::sleep(Duration::from_secs(30)).await;
      }
      Ok(input.clone())
    }
  }

  let workflow = parse_workflow(json!({
    "name": "budget",
    "version": "1.0",
    "steps": [
      { "id": "quick", "skill": "echo", "input": { "n": 1 } },
      { "id": "slow", "skill": "glacial", "depends_on": ["quick"] }
    ]
  }));

  let executor = Arc::new(SkillExecutor::new(SlowSecondInvoker));
  let engine = WorkflowEngine::with_config(
    executor,
    EngineConfig {
      workflow_timeout: Some(Duration::from_millis(100)),
      parallel: true,
    },
  );

  let err = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap_err();

  match err {
    ExecutionError::Timeout { partial, timeout_ms, .. } => {
      assert_eq!(timeout_ms, 100);
      assert_eq!(partial.executed_steps, vec!["quick"]);
      assert!(!partial.results.contains_key("slow"));
    }
    other => panic!("expected timeout, got {:?}", other),
  }
}

#[tokio::test]
async fn cancellation_aborts_the_run() {
  struct SleepyInvoker;

  #[async_trait::async_trait]
  impl SkillInvoker for SleepyInvoker {
    async fn invoke(&self, _skill: &str, input: &Value) -> Result<Value, SkillError> {
      tokio::time::sleep(Duration::from_secs(10)).await;
      Ok(input.clone())
    }
  }

  let workflow = parse_workflow(json!({
    "name": "cancel",
    "version": "1.0",
    "steps": [{ "id": "a", "skill": "nap" }]
  }));

  let engine = WorkflowEngine::new(Arc::new(SkillExecutor::new(SleepyInvoker)));
  let cancel = CancellationToken::new();
  let cancel_clone = cancel.clone();

  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel_clone.cancel();
  });

  let err = engine.execute(&workflow, cancel).await.unwrap_err();
  assert!(matches!(err, ExecutionError::Cancelled));
}

#[tokio::test]
async fn events_arrive_in_causal_order() {
  let workflow = parse_workflow(json!({
    "name": "events",
    "version": "1.0",
    "steps": [
      { "id": "first", "skill": "echo", "input": { "n": 1 } },
      { "id": "second", "skill": "echo", "input": { "n": 2 }, "depends_on": ["first"] }
    ]
  }));

  let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
  let engine = WorkflowEngine::with_notifier(
    Arc::new(SkillExecutor::new(pipeline_registry())),
    EngineConfig::default(),
    ChannelNotifier::new(tx),
  );

  engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();

  let mut labels = Vec::new();
  while let Ok(event) = rx.try_recv() {
    labels.push(match event {
      ExecutionEvent::WorkflowStarted { .. } => "workflow_started".to_string(),
      ExecutionEvent::StepStarted { step_id, .. } => format!("start:{}", step_id),
      ExecutionEvent::StepCompleted { step_id, .. } => format!("complete:{}", step_id),
      ExecutionEvent::StepFailed { step_id, .. } => format!("fail:{}", step_id),
      ExecutionEvent::StepSkipped { step_id, .. } => format!("skip:{}", step_id),
      ExecutionEvent::WorkflowCompleted { .. } => "workflow_completed".to_string(),
      ExecutionEvent::WorkflowFailed { .. } => "workflow_failed".to_string(),
    });
  }

  assert_eq!(
    labels,
    vec![
      "workflow_started",
      "start:first",
      "complete:first",
      "start:second",
      "complete:second",
      "workflow_completed",
    ]
  );
}

#[tokio::test]
async fn serial_dispatch_still_completes_the_wave() {
  let workflow = parse_workflow(json!({
    "name": "serial",
    "version": "1.0",
    "steps": [
      { "id": "a", "skill": "echo", "input": { "n": 1 } },
      { "id": "b", "skill": "echo", "input": { "n": 2 } }
    ]
  }));

  let engine = WorkflowEngine::with_config(
    Arc::new(SkillExecutor::new(pipeline_registry())),
    EngineConfig {
      workflow_timeout: None,
      parallel: false,
    },
  );

  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .unwrap();
  assert!(result.success);
  assert_eq!(result.executed_steps, vec!["a", "b"]);
}

#[tokio::test]
async fn shared_executor_caches_across_runs() {
  let workflow = parse_workflow(json!({
    "name": "cached",
    "version": "1.0",
    "steps": [{ "id": "a", "skill": "echo", "input": { "fixed": true } }]
  }));

  let executor = Arc::new(SkillExecutor::new(pipeline_registry()));
  let engine = WorkflowEngine::new(executor.clone());

  engine.execute(&workflow, CancellationToken::new()).await.unwrap();
  engine.execute(&workflow, CancellationToken::new()).await.unwrap();

  let metrics = executor.metrics("echo").unwrap();
  assert_eq!(metrics.total_executions, 1);
  assert_eq!(metrics.cache_hits, 1);
}
