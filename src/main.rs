use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use skillflow_config::WorkflowDef;
use skillflow_engine::{EngineConfig, WorkflowEngine};
use skillflow_invoker::{RegistryInvoker, SkillExecutor};
use skillflow_workflow::Workflow;

/// Skillflow - a workflow engine for skill invocation graphs
#[derive(Parser)]
#[command(name = "skillflow")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate a workflow file and report every structural problem
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Print the execution plan (order, dependencies, parallel groups)
  Plan {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a workflow against the built-in echo skill registry
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Whole-workflow timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Validate { workflow_file }) => validate(workflow_file)?,
    Some(Commands::Plan { workflow_file }) => plan(workflow_file)?,
    Some(Commands::Run {
      workflow_file,
      timeout_ms,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run(workflow_file, timeout_ms))?;
    }
    None => {
      println!("skillflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_workflow(workflow_file: &PathBuf) -> Result<Workflow> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  let def = WorkflowDef::parse(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;
  Ok(Workflow::from_def(def))
}

fn validate(workflow_file: PathBuf) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  let report = workflow.validate();

  for warning in &report.warnings {
    eprintln!("warning: {}", warning);
  }

  if report.is_valid() {
    println!("workflow '{}' is valid ({} steps)", workflow.name, workflow.steps.len());
    Ok(())
  } else {
    for issue in &report.errors {
      eprintln!("error: {}", issue);
    }
    anyhow::bail!("workflow '{}' failed validation", workflow.name);
  }
}

fn plan(workflow_file: PathBuf) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  let report = workflow.validate();
  if !report.is_valid() {
    for issue in &report.errors {
      eprintln!("error: {}", issue);
    }
    anyhow::bail!("workflow '{}' failed validation", workflow.name);
  }

  let plan = workflow.plan();
  println!("{}", serde_json::to_string_pretty(&plan)?);
  Ok(())
}

async fn run(workflow_file: PathBuf, timeout_ms: Option<u64>) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  eprintln!("Loaded workflow: {} v{}", workflow.name, workflow.version);

  let executor = Arc::new(SkillExecutor::new(RegistryInvoker::with_echo()));
  let config = EngineConfig {
    workflow_timeout: timeout_ms.map(Duration::from_millis),
    parallel: true,
  };
  let engine = WorkflowEngine::with_config(executor, config);

  let result = engine
    .execute(&workflow, CancellationToken::new())
    .await
    .context("workflow execution failed")?;

  println!("{}", serde_json::to_string_pretty(&result)?);
  if result.success {
    Ok(())
  } else {
    anyhow::bail!(
      "workflow '{}' finished with {} failed step(s)",
      workflow.name,
      result.failed_steps.len()
    );
  }
}
