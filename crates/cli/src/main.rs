//! vidscout CLI, the main entry point.
//!
//! Commands:
//! - `ask`       Answer a question from video evidence
//! - `research`  Run a long research task and save the report
//! - `gateway`   Start the HTTP/SSE server
//! - `tools`     List the tools offered for a task kind
//! - `config`    Show, locate or initialize the config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vidscout_agent::TaskKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "vidscout",
    about = "vidscout: answer questions and research topics from video evidence",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.vidscout/config.toml
    #[arg(short, long, global = true, env = "VIDSCOUT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer
    Ask {
        /// The question
        #[arg(required = true)]
        question: Vec<String>,

        /// Extra context passed along with the question
        #[arg(long)]
        context: Option<String>,

        /// Print raw SSE frames instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Research a topic and write a report
    Research {
        /// The research topic
        #[arg(required = true)]
        topic: Vec<String>,

        /// Extra context passed along with the topic
        #[arg(long)]
        context: Option<String>,

        /// Print raw SSE frames instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools offered to the model
    Tools {
        /// Task kind: interactive or research
        #[arg(short, long, default_value = "interactive")]
        kind: TaskKind,

        /// Print full JSON schemas
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the answer or SSE frames.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            question,
            context,
            json,
        } => commands::task::run(config_path, TaskKind::Interactive, question, context, json).await?,
        Commands::Research { topic, context, json } => {
            commands::task::run(config_path, TaskKind::Research, topic, context, json).await?
        }
        Commands::Gateway { port } => commands::gateway::run(config_path, port).await?,
        Commands::Tools { kind, json } => commands::tools::run(kind, json)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path),
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force)?,
        },
    }

    Ok(())
}
