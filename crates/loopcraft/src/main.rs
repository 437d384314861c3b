mod config;
mod samples;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use loopcraft_core::{LoopContext, LoopOutcome, LoopRunner, DEFAULT_MAX_ITERATIONS};
use loopcraft_llm::{LlmConfig, OpenAiClient, DEFAULT_MODEL};
use loopcraft_logging::{init_tracing, LogFormat, Logger};

use config::ProjectConfig;

#[derive(Parser, Debug)]
#[command(
    name = "loopcraft",
    about = "Agentic-pattern workbench: refine loop, prompt chains, routing, fan-out",
    version
)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Append structured JSON-lines events to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Model to use (overrides loopcraft.toml)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Iteratively generate, review and revise an artifact
    Refine {
        /// Task description (or reads from the task file if not provided)
        #[arg(short, long)]
        task: Option<String>,

        /// Path to a task file (default: ./task.md)
        #[arg(long, default_value = "task.md")]
        task_file: PathBuf,

        /// Maximum generate+review passes
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,

        /// Print the final outcome as JSON (artifact plus full history)
        #[arg(long)]
        json_output: bool,

        /// Show what would happen without calling the model
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a sequential prompt chain
    Chain {
        #[arg(short, long)]
        input: Option<String>,

        /// Which chain to run: spec extraction or plan-then-write
        #[arg(short, long, value_enum, default_value = "specs")]
        pipeline: Pipeline,
    },
    /// Extract structured fields from a document, re-extracting gaps
    Extract {
        /// Read the document from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Document text given inline
        #[arg(long)]
        text: Option<String>,
    },
    /// Classify a query into an intent and dispatch the matching handler
    Route {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Fan independent sub-tasks out in parallel, then synthesize
    Fanout {
        #[arg(short, long)]
        topic: Option<String>,
    },
    /// Answer a query with the help of the tool registry
    Ask {
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pipeline {
    /// Extract technical specifications, then shape them to JSON
    Specs,
    /// Outline a plan, then write a summary from it
    Plan,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_format: LogFormat = cli.log_format.into();
    init_tracing("info", log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();

    match cli.command {
        Command::Refine {
            ref task,
            ref task_file,
            max_iterations,
            json_output,
            dry_run,
        } => {
            let task = resolve_task(task.as_deref(), task_file, &working_dir)?;
            run_refine(RefineArgs {
                task,
                max_iterations,
                json_output,
                dry_run,
                generator_config: llm_config(&cli, &project, project.generator_model())?,
                critic_config: llm_config(&cli, &project, project.critic_model())?,
                log_format,
                log_file: cli.log_file.clone(),
            })
            .await
        }
        Command::Chain {
            ref input,
            pipeline,
        } => {
            let client = client(&cli, &project)?;
            let (chain, sample) = match pipeline {
                Pipeline::Specs => (samples::spec_chain(&client), samples::SAMPLE_SPEC_TEXT),
                Pipeline::Plan => (samples::planning_chain(&client), samples::SAMPLE_TOPIC),
            };
            let input = input.clone().unwrap_or_else(|| {
                eprintln!("No input provided; using the built-in sample text.");
                sample.to_string()
            });
            let result = chain
                .run(&input)
                .await
                .unwrap_or_else(|e| fatal(&format!("chain failed: {e}")));
            for step in &result.transcript {
                eprintln!("--- {} ---\n{}\n", step.name, step.output);
            }
            println!("{}", result.output);
            Ok(())
        }
        Command::Extract { ref file, ref text } => {
            let client = client(&cli, &project)?;
            let document = match (text, file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => {
                    eprintln!("No document provided; using the built-in sample.");
                    samples::SAMPLE_DOCUMENT.to_string()
                }
            };
            let report = samples::document_extractor(&client)
                .extract(&document)
                .await
                .unwrap_or_else(|e| fatal(&format!("extract failed: {e}")));
            if report.missing_count() > 0 {
                eprintln!(
                    "{} field(s) could not be extracted from the document.",
                    report.missing_count()
                );
            }
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            Ok(())
        }
        Command::Route { ref query } => {
            let client = client(&cli, &project)?;
            let query = query
                .clone()
                .unwrap_or_else(|| samples::SAMPLE_QUERY.to_string());
            let dispatch = samples::query_router(&client)
                .dispatch(&query)
                .await
                .unwrap_or_else(|e| fatal(&format!("route failed: {e}")));
            eprintln!("[intent: {}]", dispatch.intent);
            println!("{}", dispatch.answer);
            Ok(())
        }
        Command::Fanout { ref topic } => {
            let client = client(&cli, &project)?;
            let topic = topic
                .clone()
                .unwrap_or_else(|| samples::SAMPLE_TOPIC.to_string());
            let result = samples::research_fanout(&client)
                .run(&topic)
                .await
                .unwrap_or_else(|e| fatal(&format!("fanout failed: {e}")));
            for branch in &result.branches {
                eprintln!("--- {} ---\n{}\n", branch.name, branch.output);
            }
            println!("{}", result.merged);
            Ok(())
        }
        Command::Ask { ref query } => {
            let client = client(&cli, &project)?;
            let query = query
                .clone()
                .unwrap_or_else(|| samples::SAMPLE_QUERY.to_string());
            let result = samples::search_agent(&client)
                .answer(&query)
                .await
                .unwrap_or_else(|e| fatal(&format!("ask failed: {e}")));
            if let Some(invocation) = &result.invocation {
                eprintln!("[tool: {} <- {}]", invocation.tool, invocation.input);
            }
            println!("{}", result.answer);
            Ok(())
        }
    }
}

struct RefineArgs {
    task: String,
    max_iterations: usize,
    json_output: bool,
    dry_run: bool,
    generator_config: LlmConfig,
    critic_config: LlmConfig,
    log_format: LogFormat,
    log_file: Option<PathBuf>,
}

async fn run_refine(args: RefineArgs) -> Result<()> {
    if args.dry_run {
        println!("=== Dry Run ===");
        println!("Task: {}", preview(&args.task, 100));
        println!("Generator model: {}", args.generator_config.model);
        println!("Critic model: {}", args.critic_config.model);
        println!("Max iterations: {}", args.max_iterations);
        return Ok(());
    }

    let generator = OpenAiClient::new(args.generator_config)?;
    let critic = OpenAiClient::new(args.critic_config)?;

    let logger = match &args.log_file {
        Some(path) => {
            Logger::with_file(args.log_format, path).context("Failed to open log file")?
        }
        None => Logger::new(args.log_format),
    };

    let context = LoopContext::new(args.task).with_max_iterations(args.max_iterations);
    let runner = LoopRunner::new(&generator, &critic, Arc::new(logger));

    // Ctrl+C finishes the current iteration, then returns progress so far.
    let interrupt_handle = runner.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finishing current iteration...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    match runner.run(context).await {
        Ok(outcome) => {
            if args.json_output {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
                if let Some(artifact) = outcome.artifact() {
                    println!("{}", artifact);
                }
            }
            std::process::exit(outcome.exit_code());
        }
        Err(e) => fatal(&format!("refine failed: {e}")),
    }
}

/// Resolve the model and credential for one role. A missing API key is
/// reported here, before any loop starts.
fn llm_config(cli: &Cli, project: &ProjectConfig, role_model: Option<&str>) -> Result<LlmConfig> {
    let model = cli
        .model
        .as_deref()
        .or(role_model)
        .unwrap_or(DEFAULT_MODEL);
    let mut config = LlmConfig::from_env(model)?;
    if let Some(base_url) = &project.base_url {
        config = config.with_base_url(base_url);
    }
    Ok(config)
}

fn client(cli: &Cli, project: &ProjectConfig) -> Result<OpenAiClient> {
    Ok(OpenAiClient::new(llm_config(
        cli,
        project,
        project.model.as_deref(),
    )?)?)
}

fn resolve_task(task: Option<&str>, task_file: &Path, working_dir: &Path) -> Result<String> {
    if let Some(task) = task {
        return Ok(task.to_string());
    }

    let task_path = if task_file.is_absolute() {
        task_file.to_path_buf()
    } else {
        working_dir.join(task_file)
    };

    if task_path.exists() {
        let content =
            std::fs::read_to_string(&task_path).context("Failed to read task file")?;
        Ok(content.trim().to_string())
    } else {
        eprintln!("No task provided; using the built-in sample task.");
        Ok(samples::SAMPLE_TASK.to_string())
    }
}

fn print_outcome(outcome: &LoopOutcome) {
    match outcome {
        LoopOutcome::Approved {
            iterations,
            total_duration_secs,
            ..
        } => {
            eprintln!();
            eprintln!("=== APPROVED ===");
            eprintln!("Iterations: {}", iterations);
            eprintln!("Duration: {:.1}s", total_duration_secs);
        }
        LoopOutcome::MaxIterationsReached {
            iterations,
            total_duration_secs,
            ..
        } => {
            eprintln!();
            eprintln!("=== INCOMPLETE ===");
            eprintln!("Reached maximum iterations ({})", iterations);
            eprintln!("Duration: {:.1}s", total_duration_secs);
            eprintln!("Returning the latest version; the critic did not approve it.");
        }
        LoopOutcome::Interrupted {
            iterations,
            total_duration_secs,
            ..
        } => {
            eprintln!();
            eprintln!("=== INTERRUPTED ===");
            eprintln!("Stopped after {} completed iteration(s)", iterations);
            eprintln!("Duration: {:.1}s", total_duration_secs);
        }
    }
}

fn preview(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

/// Unrecoverable run failure: report and exit 2.
fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(2);
}
