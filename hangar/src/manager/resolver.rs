//! Project-to-executable resolution.
//!
//! Resolution answers one question at open-time: which binary launches
//! this project right now? Checks run in a fixed order so the user sees
//! the most actionable problem first:
//!
//! 1. the project descriptor must exist on disk,
//! 2. the bound engine version must be marked installed,
//! 3. the recorded executable must still exist at its path.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::project::{Project, PROJECT_DESCRIPTOR};
use crate::store::InstallationStore;

/// Why a project could not be resolved to a launchable executable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The project directory lost its descriptor since registration.
    #[error("project has no {PROJECT_DESCRIPTOR} at {}", path.display())]
    ProjectDescriptorMissing { path: PathBuf },

    /// The bound engine version is not marked installed.
    #[error("engine {version} is not installed")]
    EngineNotInstalled { version: String },

    /// The store records an executable that no longer exists on disk.
    #[error("executable for engine {version} is missing at {}", path.display())]
    ExecutableMissing { version: String, path: PathBuf },
}

/// Resolve a project to the executable that should launch it.
///
/// Pure lookup: no store mutation, no process spawn. The returned path
/// exists at the time of the check.
pub fn resolve(project: &Project, store: &InstallationStore) -> Result<PathBuf, ResolveError> {
    if !project.has_descriptor() {
        return Err(ResolveError::ProjectDescriptorMissing {
            path: project.descriptor_path(),
        });
    }

    let version = &project.engine_version;
    let Some(executable) = store.installed_path(version) else {
        return Err(ResolveError::EngineNotInstalled {
            version: version.clone(),
        });
    };

    if !executable.is_file() {
        return Err(ResolveError::ExecutableMissing {
            version: version.clone(),
            path: executable.to_path_buf(),
        });
    }

    debug!(
        project = %project.name,
        executable = %executable.display(),
        "resolved project"
    );
    Ok(executable.to_path_buf())
}
