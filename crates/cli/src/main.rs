//! Agent foundry CLI entry point.
//!
//! Commands:
//! - `init`      — Write a default config file
//! - `serve`     — Start the HTTP gateway
//! - `run`       — Run a spec file on one message, streaming events
//! - `validate`  — Check a spec file against the rules and the tool registry
//! - `tools`     — List the built-in tools
//! - `design`    — One turn with the elicitation engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "foundry",
    about = "Agent foundry: design, validate, and run declarative LLM agents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to ~/.foundry/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Run an agent spec on a single message
    Run {
        /// Path to the spec JSON document
        #[arg(short, long)]
        spec: PathBuf,

        /// The user message
        #[arg(short, long)]
        message: String,

        /// Checkpoint the conversation under this session id
        #[arg(long)]
        session: Option<String>,

        /// Print raw events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Validate an agent spec document
    Validate {
        /// Path to the spec JSON document
        file: PathBuf,
    },

    /// List the built-in tools
    Tools,

    /// Describe an agent in plain language and get questions or a spec back
    Design {
        /// What the agent should do
        intent: String,

        /// Continue an earlier design conversation
        #[arg(long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so `run --json` output stays clean.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { force } => commands::init::run(force)?,
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Run {
            spec,
            message,
            session,
            json,
        } => commands::run::run(&spec, message, session, json).await?,
        Commands::Validate { file } => commands::validate::run(&file)?,
        Commands::Tools => commands::tools::run(),
        Commands::Design { intent, session } => commands::design::run(intent, session).await?,
    }

    Ok(())
}
