//! Error types for the engine lifecycle manager.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::manager::resolver::ResolveError;
use crate::store::StoreError;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors from the download/install/launch pipeline.
///
/// A failure always aborts only the pipeline it occurred in; other
/// installed versions and registered projects are unaffected.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Network-level download failure: DNS, connect, timeout, non-2xx.
    #[error("download from {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// Local write failure while streaming or extracting.
    #[error("failed to write {}: {source}", path.display())]
    Disk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The downloaded archive could not be read as a zip, or contains
    /// an entry the installer refuses to extract.
    #[error("archive {} is corrupt: {reason}", path.display())]
    ArchiveCorrupt { path: PathBuf, reason: String },

    /// The archive extracted cleanly but no launchable binary was
    /// identified anywhere under the destination.
    #[error("no engine executable found under {}", dir.display())]
    ExecutableNotFound { dir: PathBuf },

    /// Spawning the engine process failed.
    ///
    /// Carries both paths so the user can spot a stale or moved install.
    #[error(
        "failed to launch {} for project {}: {source}",
        executable.display(),
        project.display()
    )]
    LaunchFailed {
        executable: PathBuf,
        project: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The download was cancelled before completion.
    #[error("download cancelled before completion")]
    Cancelled,

    /// An install pipeline for this version is already running.
    #[error("an install of {version} is already in progress")]
    InstallInProgress { version: String },

    /// The version is already marked installed.
    #[error("engine {version} is already installed")]
    AlreadyInstalled { version: String },

    /// The version label is not in the catalog.
    #[error("unknown engine version {version}")]
    UnknownVersion { version: String },

    /// Persisting the store failed after the in-memory mutation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A project could not be resolved to a launchable executable.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
