//! Crabdesk CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway
//! - `message`  — Run a single customer message through the agent
//! - `seed`     — Initialize the SQLite schema and seed the knowledge base
//! - `status`   — Show configuration and store counts

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "crabdesk",
    about = "Crabdesk — plan-then-execute customer support agent",
    version,
    author
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Handle a single customer message and print the reply with its trace
    Message {
        /// The customer message text
        text: String,

        /// Customer name attached to the message
        #[arg(long)]
        name: Option<String>,

        /// Customer email attached to the message
        #[arg(long)]
        email: Option<String>,
    },

    /// Initialize the SQLite schema and seed the knowledge base
    Seed,

    /// Show configuration and store counts
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Message { text, name, email } => commands::message::run(text, name, email).await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
