mod commands;
mod config;
mod store;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, recover, replay, InitArgs, RecoverArgs, ReplayArgs};
use tracing_subscriber::EnvFilter;

/// FormSync CLI - drive the form document sync core from the terminal
#[derive(Parser, Debug)]
#[command(name = "formsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default formsync.config.json
    Init(InitArgs),

    /// Replay a JSON edit script through history and auto-save
    Replay(ReplayArgs),

    /// Show (and optionally restore) the local copy of a form
    Recover(RecoverArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Replay(args) => replay(args, &cwd).await,
            Command::Recover(args) => recover(args, &cwd).await,
        },
        Err(e) => Err(anyhow::anyhow!("Cannot get current directory: {}", e)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
