mod config;
mod error;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use runtime::tools::math;
use runtime::{Agent, Dispatcher, OpenAiBackend, OpenAiBackendBuilder, RemoteTools};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{Config, ToolSource};
use error::Result;

#[derive(Parser)]
#[command(name = "wizard")]
#[command(about = "Math Wizard, a chat agent that calls tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (default: ./wizard.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// The question
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// List the tools offered to the model
    Tools,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }

    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(&config).await,
        Some(Commands::Ask { prompt }) => cmd_ask(&config, &prompt.join(" ")).await,
        Some(Commands::Tools) => cmd_tools(&config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn cmd_chat(config: &Config) -> Result<()> {
    let mut agent = build_agent(config).await?;

    println!("Math Wizard v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: {}", agent.backend());
    println!("Ask me to add numbers! Type 'quit' or Ctrl+D to exit.\n");

    let result = chat_loop(&mut agent).await;
    println!("Wizard: Goodbye!");

    let shutdown = agent.shutdown().await;
    result?;
    Ok(shutdown?)
}

async fn chat_loop(agent: &mut Agent<OpenAiBackend>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            return Ok(());
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            return Ok(());
        }

        // Dropping the turn on Ctrl-C keeps whatever it already appended
        tokio::select! {
            outcome = agent.run(input) => println!("Wizard: {}\n", outcome.reply()),
            _ = tokio::signal::ctrl_c() => println!("\nWizard: (cancelled)\n"),
        }
    }
}

async fn cmd_ask(config: &Config, prompt: &str) -> Result<()> {
    let mut agent = build_agent(config).await?;

    let outcome = agent.run(prompt).await;
    println!("{}", outcome.reply());

    let shutdown = agent.shutdown().await;
    outcome.into_result()?;
    Ok(shutdown?)
}

async fn cmd_tools(config: &Config) -> Result<()> {
    let dispatcher = dispatcher(config).await?;

    if dispatcher.descriptors().is_empty() {
        println!("No tools configured.");
    }
    for tool in dispatcher.descriptors() {
        println!("{:<12}  {}", tool.name, tool.description);
    }

    Ok(dispatcher.shutdown().await?)
}

/// Build the agent. The credential is checked before any tool server is
/// started.
async fn build_agent(config: &Config) -> Result<Agent<OpenAiBackend>> {
    let backend = config.model.backend(OpenAiBackendBuilder::from_env()?);
    let dispatcher = dispatcher(config).await?;

    let agent = Agent::builder(backend)
        .system_prompt(&config.agent.system_prompt)
        .max_iterations(config.agent.max_iterations)
        .tool_call_policy(config.agent.tool_calls)
        .dispatcher(dispatcher)
        .build()?;

    debug!(
        conversation = %agent.conversation().id(),
        tools = agent.tools().len(),
        "agent ready"
    );
    Ok(agent)
}

async fn dispatcher(config: &Config) -> Result<Dispatcher> {
    let dispatcher = match config.tools.source {
        ToolSource::Local => math::registry()?.into(),
        ToolSource::Remote => {
            RemoteTools::spawn(config.tools.remote.server_config())
                .await?
                .into()
        }
        ToolSource::None => Dispatcher::none(),
    };
    Ok(dispatcher)
}
