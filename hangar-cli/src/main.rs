//! Hangar CLI - manage Godot engine versions and projects.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use commands::config::ConfigCommands;
use commands::engines::EngineCommands;
use commands::projects::ProjectCommands;

#[derive(Debug, Parser)]
#[command(
    name = "hangar",
    version,
    about = "Godot engine version and project manager"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage engine versions
    #[command(subcommand)]
    Engines(EngineCommands),

    /// Manage registered projects
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// View and change settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Engines(command) => commands::engines::run(command),
        Commands::Projects(command) => commands::projects::run(command),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        eprintln!("{} {e}", style("error:").red().bold());
        std::process::exit(1);
    }
}
