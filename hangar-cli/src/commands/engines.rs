//! Engine subcommands: list, install, register, uninstall.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use hangar::manager::{PipelinePhase, PipelineProgressCallback};

use super::load_manager;
use crate::error::CliError;

/// Engine subcommands.
#[derive(Debug, Subcommand)]
pub enum EngineCommands {
    /// List known engine versions and their install state
    List {
        /// Show only installed versions
        #[arg(long)]
        installed: bool,
    },

    /// Download and install an engine version
    Install {
        /// Version label, e.g. 4.3
        version: String,
    },

    /// Register an already-present engine binary as an install
    Register {
        /// Version label the binary implements
        version: String,

        /// Path to the engine executable
        executable: PathBuf,
    },

    /// Mark an engine version uninstalled (files are kept on disk)
    Uninstall {
        /// Version label, e.g. 4.3
        version: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Run an engines subcommand.
pub fn run(command: EngineCommands) -> Result<(), CliError> {
    match command {
        EngineCommands::List { installed } => run_list(installed),
        EngineCommands::Install { version } => run_install(&version),
        EngineCommands::Register {
            version,
            executable,
        } => run_register(&version, executable),
        EngineCommands::Uninstall { version, yes } => run_uninstall(&version, yes),
    }
}

/// List catalog versions with install state.
fn run_list(installed_only: bool) -> Result<(), CliError> {
    let manager = load_manager()?;

    println!("Engine versions");
    println!("===============");

    let listings = if installed_only {
        manager.installed_engines()
    } else {
        manager.engines()
    };

    for listing in listings {
        let marker = if listing.installed { "*" } else { " " };
        let state = match listing.installed_path {
            Some(ref path) => format!("installed at {}", path.display()),
            None => "not installed".to_string(),
        };
        println!(
            "{marker} {:<8} {:<8} {state}",
            listing.release.version, listing.release.size
        );
    }

    Ok(())
}

/// Install a version with a progress bar; Ctrl-C cancels cleanly.
fn run_install(version: &str) -> Result<(), CliError> {
    let manager = load_manager()?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg:<22} [{bar:40}] {percent:>3}%")
            .expect("valid progress template")
            .progress_chars("=> "),
    );

    let progress_bar = bar.clone();
    let progress: PipelineProgressCallback = Box::new(move |phase, fraction| {
        progress_bar.set_message(phase.name());
        match fraction {
            Some(f) => progress_bar.set_position((f * 100.0) as u64),
            None if phase != PipelinePhase::Download => progress_bar.tick(),
            None => {}
        }
    });

    let handle = manager.install_in_background(version, Some(progress));

    let cancel = handle.cancel_token();
    ctrlc::set_handler(move || cancel.cancel())?;

    match handle.wait() {
        Ok(executable) => {
            bar.finish_with_message("complete");
            println!(
                "Installed {} at {}",
                style(version).green(),
                executable.display()
            );
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e.into())
        }
    }
}

/// Record a pre-existing binary as an install.
fn run_register(version: &str, executable: PathBuf) -> Result<(), CliError> {
    let manager = load_manager()?;

    if !executable.is_file() {
        return Err(CliError::Config(format!(
            "no file at {}",
            executable.display()
        )));
    }

    manager.register_manual_install(version, &executable)?;
    println!("Registered {} -> {}", version, executable.display());
    Ok(())
}

/// Mark a version uninstalled after confirmation.
fn run_uninstall(version: &str, yes: bool) -> Result<(), CliError> {
    let manager = load_manager()?;

    if !manager.store().lock().is_installed(version) {
        return Err(CliError::Config(format!(
            "engine {version} is not installed"
        )));
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Mark {version} uninstalled? Files on disk are kept."
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    manager.uninstall(version)?;
    println!("Engine {version} marked uninstalled; files were not deleted.");
    Ok(())
}
