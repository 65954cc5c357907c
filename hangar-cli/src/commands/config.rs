//! Settings subcommands: show, set, path.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use hangar::store::store_file_path;

use super::load_manager;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show all settings
    Show,

    /// Set a setting
    Set {
        /// Setting to change
        key: SettingKey,

        /// New directory path
        value: PathBuf,
    },

    /// Show the data file path
    Path,
}

/// Settable keys.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SettingKey {
    /// Default directory for new projects
    ProjectDir,

    /// Default directory engine versions install under
    EngineDir,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(),
        ConfigCommands::Set { key, value } => run_set(key, value),
        ConfigCommands::Path => run_path(),
    }
}

/// Show current settings.
fn run_show() -> Result<(), CliError> {
    let manager = load_manager()?;
    let store = manager.store().lock();
    let settings = store.settings();

    println!("Settings");
    println!("========");
    println!(
        "  project-dir = {}",
        settings.default_project_dir.display()
    );
    println!("  engine-dir  = {}", settings.default_engine_dir.display());

    Ok(())
}

/// Change a setting.
fn run_set(key: SettingKey, value: PathBuf) -> Result<(), CliError> {
    let manager = load_manager()?;
    let mut store = manager.store().lock();

    match key {
        SettingKey::ProjectDir => store.set_default_project_dir(&value)?,
        SettingKey::EngineDir => store.set_default_engine_dir(&value)?,
    }

    println!("Set {key:?} = {}", value.display());
    Ok(())
}

/// Show where the data file lives.
fn run_path() -> Result<(), CliError> {
    println!("{}", store_file_path().display());
    Ok(())
}
