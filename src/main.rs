use clap::{Parser, Subcommand};
use ragchat::Result;
use ragchat::commands::{document_chat, qa_chat, travel_chat};
use ragchat::config::{run_interactive_config, show_config};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Groq-powered chatbots: general Q&A, PDF document Q&A and a travel assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure embedding, completion and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chat with a general question-answering bot
    Ask,
    /// Chat with Travel Buddy
    Travel,
    /// Ask questions about a directory of PDF files
    Docs {
        /// Directory containing the PDFs, overriding the configured one
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Build the index before the first question
        #[arg(long)]
        build: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ask => {
            qa_chat()?;
        }
        Commands::Travel => {
            travel_chat()?;
        }
        Commands::Docs { dir, build } => {
            document_chat(dir, build)?;
        }
    }

    Ok(())
}
