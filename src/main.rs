use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use weaver_config::{ExecConfig, WorkflowDef};
use weaver_render::{Assembler, Layout, TemplateRenderer};
use weaver_resolver::{Resolver, StandardResolver};
use weaver_workflow::{LinkGraph, LinkedWorkflow};

/// Weaver - compiles level/thread/step pipeline definitions into
/// orchestration artifacts
#[derive(Parser)]
#[command(name = "weaver")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  log_json: bool,

  /// Fail when step links form a cycle
  #[arg(long, global = true)]
  deny_cycles: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a pipeline definition into an artifact
  Generate {
    /// Path to the pipeline definition (JSON)
    workflow_file: PathBuf,

    /// Path to the execution parameters (JSON object)
    #[arg(long)]
    params: PathBuf,

    /// Where to write the artifact
    #[arg(long)]
    output: PathBuf,

    /// Artifact flavor
    #[arg(long, value_enum, default_value_t = Target::Workflows)]
    target: Target,

    /// Template directory (default: templates/<target>)
    #[arg(long)]
    templates: Option<PathBuf>,
  },

  /// Validate a pipeline definition and resolve its links
  Validate {
    /// Path to the pipeline definition (JSON)
    workflow_file: PathBuf,
  },

  /// Print the resolved link table as JSON
  Links {
    /// Path to the pipeline definition (JSON)
    workflow_file: PathBuf,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
  /// Workflow-engine document (YAML)
  Workflows,
  /// DAG script (Python)
  Composer,
}

impl Target {
  fn name(self) -> &'static str {
    match self {
      Target::Workflows => "workflows",
      Target::Composer => "composer",
    }
  }

  fn layout(self) -> Layout {
    match self {
      Target::Workflows => Layout::workflows(),
      Target::Composer => Layout::composer(),
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(&cli.log_level, cli.log_json);

  let resolver = StandardResolver::new().deny_cycles(cli.deny_cycles);

  match cli.command {
    Commands::Generate {
      workflow_file,
      params,
      output,
      target,
      templates,
    } => {
      let templates = templates.unwrap_or_else(|| Path::new("templates").join(target.name()));
      generate(&resolver, &workflow_file, &params, &output, target, &templates)?;
    }
    Commands::Validate { workflow_file } => {
      let linked = resolve(&resolver, &workflow_file)?;
      print_summary(&linked);
    }
    Commands::Links { workflow_file } => {
      let linked = resolve(&resolver, &workflow_file)?;
      print_links(&linked)?;
    }
  }

  Ok(())
}

fn init_tracing(level: &str, json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::registry()
    .with(filter)
    .with(json.then(|| fmt::layer().json().with_writer(io::stderr)))
    .with((!json).then(|| fmt::layer().without_time().with_writer(io::stderr)))
    .init();
}

fn generate(
  resolver: &StandardResolver,
  workflow_file: &Path,
  params_file: &Path,
  output: &Path,
  target: Target,
  templates: &Path,
) -> Result<()> {
  let linked = resolve(resolver, workflow_file)?;

  let params_content = std::fs::read_to_string(params_file)
    .with_context(|| format!("failed to read params file: {}", params_file.display()))?;
  let config: ExecConfig = serde_json::from_str(&params_content)
    .with_context(|| format!("failed to parse params file: {}", params_file.display()))?;

  let layout = target.layout();
  let renderer = TemplateRenderer::from_dir(templates, &layout.extension)
    .with_context(|| format!("failed to load templates from {}", templates.display()))?;

  let artifact = Assembler::new(&renderer, layout, config)
    .assemble(&linked)
    .context("failed to render artifact")?;

  artifact
    .write_to(output)
    .with_context(|| format!("failed to write artifact: {}", output.display()))?;

  eprintln!("Generated {} artifact: {}", target.name(), output.display());
  Ok(())
}

fn resolve(resolver: &StandardResolver, workflow_file: &Path) -> Result<LinkedWorkflow> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  resolver
    .resolve(def)
    .with_context(|| format!("failed to resolve workflow: {}", workflow_file.display()))
}

fn print_summary(linked: &LinkedWorkflow) {
  let workflow = &linked.workflow;
  let threads: usize = workflow.levels.iter().map(|level| level.threads.len()).sum();

  println!(
    "OK: {} levels, {} threads, {} steps",
    workflow.levels.len(),
    threads,
    linked.links.len()
  );
  for level in &workflow.levels {
    let shape = if level.is_single_thread() {
      "single"
    } else {
      "parallel"
    };
    println!("  {} ({}, {} threads)", level.symbol(), shape, level.threads.len());
  }
}

fn print_links(linked: &LinkedWorkflow) -> Result<()> {
  let json =
    serde_json::to_string_pretty(&linked.links).context("failed to serialize link table")?;
  println!("{}", json);

  let graph = LinkGraph::new(&linked.workflow, &linked.links);
  for step_id in graph.join_points() {
    eprintln!(
      "join point: {} <- {}",
      step_id,
      graph.upstream(step_id).join(", ")
    );
  }
  if let Some(cycle) = graph.find_cycle() {
    eprintln!("cycle: {}", cycle.join(" -> "));
  }

  Ok(())
}
