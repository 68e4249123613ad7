use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod utils;

use commands::{health, whitelist};

/// Bookshelf CLI - inspect application whitelists and probe a running server
#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Whitelist file (defaults to <project>/config/whitelist.yaml)
    #[arg(long, global = true, env = "WHITELIST_FILE")]
    whitelist: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a running server's health endpoint
    Health {
        /// Base URL of the server
        #[arg(long, env = "SHELF_API_URL", default_value = "http://localhost:3030")]
        url: String,

        /// Application id sent in the AppId header
        #[arg(long, default_value = "shelf-cli")]
        app_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Application whitelist commands
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// List every registered application and what it may call
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check whether an application may call an operation (exit code 1 when denied)
    Check {
        /// Calling application id
        app_id: String,
        /// Controller name, e.g. Books
        controller: String,
        /// Operation name, e.g. GetBooksAsync
        operation: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Health {
            url,
            app_id,
            format,
        } => health::execute(&url, &app_id, format).await,
        Commands::Whitelist { action } => {
            let path = whitelist::resolve_path(cli.whitelist)?;
            match action {
                WhitelistAction::List { format } => whitelist::list(&path, format),
                WhitelistAction::Check {
                    app_id,
                    controller,
                    operation,
                } => whitelist::check(&path, &app_id, &controller, &operation),
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
