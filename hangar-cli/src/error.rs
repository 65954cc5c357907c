//! CLI error type.

use thiserror::Error;

use hangar::manager::ManagerError;
use hangar::project::ProjectError;
use hangar::store::StoreError;

/// Errors surfaced to the terminal user.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine lifecycle operation failed.
    #[error(transparent)]
    Manager(#[from] ManagerError),

    /// Reading or writing the data store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Project import or scaffolding failed.
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Bad argument or configuration.
    #[error("{0}")]
    Config(String),

    /// An interactive prompt failed.
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Installing the Ctrl-C handler failed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
