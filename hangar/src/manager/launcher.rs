//! Detached engine process launch.
//!
//! The editor is spawned as an independent child with its working
//! directory set to the project root and all standard streams
//! discarded. The manager does not wait on, supervise, or reap the
//! process; its lifetime after a successful spawn is the user's
//! business.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::info;

use crate::manager::error::{ManagerError, ManagerResult};

/// Spawn the engine editor for a project.
///
/// Runs `<executable> --editor --path <project_root>` with the project
/// root as the working directory. Returns the child handle; callers
/// typically drop it immediately.
pub fn launch(executable: &Path, project_root: &Path) -> ManagerResult<Child> {
    let child = Command::new(executable)
        .arg("--editor")
        .arg("--path")
        .arg(project_root)
        .current_dir(project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ManagerError::LaunchFailed {
            executable: executable.to_path_buf(),
            project: project_root.to_path_buf(),
            source: e,
        })?;

    info!(
        executable = %executable.display(),
        project = %project_root.display(),
        pid = child.id(),
        "launched editor"
    );
    Ok(child)
}
