//! planwise - command line entry point.
//!
//! Runs one question through the plan-execute agent (or the reactive loop
//! with `--mode react`), printing trace entries as they are recorded and
//! then the final answer.

use clap::{Parser, ValueEnum};
use planwise::agent::{Agent, AgentError, TraceEntry, TraceKind, TraceObserver};
use planwise::config::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_QUESTION: &str = "What is 18% of India's GDP growth?";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Plan the task, then execute it step by step
    Plan,
    /// Loop tool calls until the model answers
    React,
}

#[derive(Debug, Parser)]
#[command(
    name = "planwise",
    version,
    about = "Tool-calling agent with plan-then-execute orchestration"
)]
struct Cli {
    /// Question to answer
    #[arg(default_value = DEMO_QUESTION)]
    question: String,

    /// Orchestration mode
    #[arg(long, value_enum, default_value_t = Mode::Plan)]
    mode: Mode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; variables may come from the environment.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planwise=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.default_model);

    let agent = Agent::new(&config)?.with_trace_observer(TraceObserver::new(print_entry));
    let tool_names: Vec<String> = agent
        .tools()
        .list_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();
    info!("Agent ready: model={} tools={:?}", agent.model(), tool_names);

    let result = match cli.mode {
        Mode::Plan => agent.execute_plan(&cli.question).await.map(|outcome| {
            for (key, value) in outcome.state.iter() {
                info!("State: {} = {}", key, value);
            }
            outcome.answer
        }),
        Mode::React => agent.ask(&cli.question).await.map(|outcome| outcome.answer),
    };

    match result {
        Ok(answer) => {
            println!("\nFinal Answer:\n{}", answer);
            Ok(())
        }
        Err(AgentError::Llm(e)) => {
            eprintln!("model provider failure: {}", e);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("agent error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_entry(entry: &TraceEntry) {
    match entry.kind {
        TraceKind::Plan => println!("\nPLAN:\n{}", entry.content),
        TraceKind::Step => println!("\nExecuting Step: {}", entry.content),
        TraceKind::ToolCall => println!("Tool Call: {}", entry.content),
        TraceKind::ToolResult => println!("Tool Result: {}", entry.content),
        TraceKind::StateStored => println!("Stored in state: {}", entry.content),
        TraceKind::StepResult => println!("Step Result: {}", entry.content),
        TraceKind::FinalAnswer => {}
    }
}
