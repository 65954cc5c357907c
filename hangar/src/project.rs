//! Project records and descriptor handling.
//!
//! A project is a directory containing a `project.godot` descriptor,
//! registered in the store together with the engine version it is bound
//! to. The descriptor is only required at open-time: newly scaffolded
//! projects may be registered before the directory exists on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;

/// File name of the descriptor that marks a directory as a project.
pub const PROJECT_DESCRIPTOR: &str = "project.godot";

/// Engine version assumed for descriptors in the 4.x config format
/// when the descriptor does not name a version itself.
const FALLBACK_VERSION_4X: &str = "4.3";

/// Engine version assumed for descriptors in the 3.x config format.
const FALLBACK_VERSION_3X: &str = "3.6";

/// Errors from project import and scaffolding.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The directory does not contain a project descriptor.
    #[error("no {PROJECT_DESCRIPTOR} found in {}", root.display())]
    DescriptorMissing { root: PathBuf },

    /// Reading or writing project files failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A registered project and its engine binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Display name; not guaranteed unique.
    pub name: String,

    /// Absolute path of the project root directory.
    pub root: PathBuf,

    /// Version label of the engine this project is bound to.
    ///
    /// May reference a version that is not currently installed; the
    /// resolver reports that at open-time.
    pub engine_version: String,

    /// Date the project was last opened through the launcher.
    pub last_opened: NaiveDate,
}

impl Project {
    /// Create a project record with today's date as last-opened.
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        engine_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            engine_version: engine_version.into(),
            last_opened: Local::now().date_naive(),
        }
    }

    /// Path of this project's descriptor file.
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(PROJECT_DESCRIPTOR)
    }

    /// Whether the descriptor currently exists on disk.
    pub fn has_descriptor(&self) -> bool {
        self.descriptor_path().is_file()
    }

    /// Mark the project as opened today.
    pub fn touch_last_opened(&mut self) {
        self.last_opened = Local::now().date_naive();
    }

    /// Import an existing project directory.
    ///
    /// The project name is taken from the directory name and the engine
    /// version is detected from the descriptor contents, best-effort.
    pub fn import(root: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let root = root.into();
        let descriptor = root.join(PROJECT_DESCRIPTOR);
        if !descriptor.is_file() {
            return Err(ProjectError::DescriptorMissing { root });
        }

        let contents = fs::read_to_string(&descriptor).map_err(|e| ProjectError::Io {
            path: descriptor,
            source: e,
        })?;

        let version =
            detect_engine_version(&contents).unwrap_or_else(|| FALLBACK_VERSION_4X.to_string());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "imported".to_string());

        Ok(Self::new(name, root, version))
    }
}

/// Detect the engine version a descriptor was written for.
///
/// Prefers the version named in `config/features=PackedStringArray("4.3")`,
/// which modern descriptors carry. Falls back to mapping the
/// `config_version` format number to an engine era (5 is the 4.x format,
/// 4 the 3.x format). Returns `None` when neither is present; this is a
/// best-effort guess, not a contract.
pub fn detect_engine_version(descriptor: &str) -> Option<String> {
    let mut from_config_version = None;

    for line in descriptor.lines() {
        let line = line.trim();

        if line.starts_with("config/features") {
            if let Some(version) = first_quoted_version(line) {
                return Some(version);
            }
        }

        if let Some(value) = line.strip_prefix("config_version=") {
            from_config_version = match value.trim() {
                "5" => Some(FALLBACK_VERSION_4X.to_string()),
                "4" => Some(FALLBACK_VERSION_3X.to_string()),
                _ => from_config_version,
            };
        }
    }

    from_config_version
}

/// Extract the first double-quoted token that looks like a version
/// number (starts with a digit) from a descriptor line.
fn first_quoted_version(line: &str) -> Option<String> {
    let mut rest = line;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        let end = after.find('"')?;
        let token = &after[..end];
        if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some(token.to_string());
        }
        rest = &after[end + 1..];
    }
    None
}

/// Create a project directory with a minimal descriptor.
///
/// Writes a `project.godot` naming the project and the feature version
/// of the engine it is bound to, then returns the matching record.
/// Existing files are not touched beyond the descriptor itself.
pub fn scaffold(
    name: &str,
    root: impl Into<PathBuf>,
    engine_version: &str,
) -> Result<Project, ProjectError> {
    let root = root.into();
    fs::create_dir_all(&root).map_err(|e| ProjectError::Io {
        path: root.clone(),
        source: e,
    })?;

    let descriptor = root.join(PROJECT_DESCRIPTOR);
    let contents = format!(
        "; Engine configuration file.\n\n\
         config_version=5\n\n\
         [application]\n\n\
         config/name=\"{name}\"\n\
         config/features=PackedStringArray(\"{engine_version}\")\n",
    );
    fs::write(&descriptor, contents).map_err(|e| ProjectError::Io {
        path: descriptor,
        source: e,
    })?;

    Ok(Project::new(name, root, engine_version))
}
