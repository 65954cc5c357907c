//! CLI command implementations.
//!
//! Each submodule owns one subcommand group: its clap argument types
//! and a `run` entry point dispatching to per-command functions.

pub mod config;
pub mod engines;
pub mod projects;

use hangar::catalog::Catalog;
use hangar::manager::EngineManager;
use hangar::store::{self, InstallationStore};

use crate::error::CliError;

/// Build the production manager: built-in catalog over the store at
/// its default location.
fn load_manager() -> Result<EngineManager, CliError> {
    let store = InstallationStore::load_default()?;
    Ok(EngineManager::new(Catalog::builtin(), store::shared(store)))
}
