//! Durable record of engine installs and registered projects.
//!
//! The [`InstallationStore`] owns all engine override records and
//! project records. Collaborators (CLI, future UI) hold it behind a
//! [`SharedStore`] handle and route every mutation through the
//! operations here so the persist-on-mutation invariant holds: each
//! mutator rewrites the whole store file synchronously before it
//! returns. There is no dirty state visible to callers.
//!
//! Loading is lenient - a missing file is an empty store, malformed
//! lines are skipped - but persist failures are always surfaced, since
//! a silently lost write followed by process exit would lose state.

mod error;
mod format;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::project::Project;

pub use error::{StoreError, StoreResult};

/// Store handle shared between the foreground collaborator layer and
/// background install pipelines. Single writer at a time.
pub type SharedStore = Arc<Mutex<InstallationStore>>;

/// Wrap a store in a [`SharedStore`] handle.
pub fn shared(store: InstallationStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Global path settings carried by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory new projects are created under by default.
    pub default_project_dir: PathBuf,

    /// Directory engine versions are installed under by default.
    pub default_engine_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            default_project_dir: home.join("GodotProjects"),
            default_engine_dir: home.join("Godot"),
        }
    }
}

/// Install-state override for one engine version.
///
/// Versions without a record default to not-installed. Invariant:
/// `installed` is `true` iff `installed_path` is `Some`; every mutator
/// maintains this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRecord {
    /// Version label this record overrides.
    pub version: String,

    /// Whether the version is currently marked installed.
    pub installed: bool,

    /// Absolute path of the installed executable, when installed.
    pub installed_path: Option<PathBuf>,
}

impl EngineRecord {
    /// Check the installed-iff-path invariant.
    pub fn is_consistent(&self) -> bool {
        self.installed == self.installed_path.as_ref().is_some_and(|p| !p.as_os_str().is_empty())
    }
}

/// Durable aggregate of settings, engine overrides and projects.
#[derive(Debug)]
pub struct InstallationStore {
    /// Backing file; every mutation rewrites it in full.
    path: PathBuf,
    settings: Settings,
    engines: Vec<EngineRecord>,
    projects: Vec<Project>,
}

/// Default location of the store file.
pub fn store_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hangar")
        .join("store.txt")
}

impl InstallationStore {
    /// Create an empty store backed by the given file.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
            engines: Vec::new(),
            projects: Vec::new(),
        }
    }

    /// Load the store from a file.
    ///
    /// A missing file yields an empty store; that is the normal first
    /// run, not an error. Malformed lines inside an existing file are
    /// skipped individually.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store file yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(e) => return Err(StoreError::ReadFailed { path, source: e }),
        };

        let doc = format::parse(&text);
        info!(
            path = %path.display(),
            engines = doc.engines.len(),
            projects = doc.projects.len(),
            "loaded store"
        );

        Ok(Self {
            path,
            settings: doc.settings,
            engines: doc.engines,
            projects: doc.projects,
        })
    }

    /// Load the store from its default location.
    pub fn load_default() -> StoreResult<Self> {
        Self::load(store_file_path())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current global path settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// All engine override records, in insertion order.
    pub fn engines(&self) -> &[EngineRecord] {
        &self.engines
    }

    /// All registered projects, in insertion order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// The project at `index`, if registered.
    pub fn project(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    /// The override record for a version, if any.
    pub fn engine_record(&self, version: &str) -> Option<&EngineRecord> {
        self.engines.iter().find(|r| r.version == version)
    }

    /// Whether a version is currently marked installed.
    pub fn is_installed(&self, version: &str) -> bool {
        self.engine_record(version).is_some_and(|r| r.installed)
    }

    /// Installed executable path for a version, if marked installed.
    pub fn installed_path(&self, version: &str) -> Option<&Path> {
        self.engine_record(version)
            .filter(|r| r.installed)
            .and_then(|r| r.installed_path.as_deref())
    }

    /// Mark a version installed at the given executable path.
    ///
    /// Idempotent: repeating the call with the same arguments leaves the
    /// same observable state. An existing record's path is overwritten.
    pub fn mark_installed(
        &mut self,
        version: &str,
        executable: impl Into<PathBuf>,
    ) -> StoreResult<()> {
        let executable = executable.into();
        match self.engines.iter_mut().find(|r| r.version == version) {
            Some(record) => {
                record.installed = true;
                record.installed_path = Some(executable);
            }
            None => self.engines.push(EngineRecord {
                version: version.to_string(),
                installed: true,
                installed_path: Some(executable),
            }),
        }
        info!(version, "marked engine installed");
        self.persist()
    }

    /// Mark a version not installed and clear its path.
    ///
    /// Bookkeeping only: nothing is deleted from disk, and projects
    /// bound to the version keep their (now stale) binding.
    pub fn mark_uninstalled(&mut self, version: &str) -> StoreResult<()> {
        match self.engines.iter_mut().find(|r| r.version == version) {
            Some(record) => {
                record.installed = false;
                record.installed_path = None;
            }
            None => self.engines.push(EngineRecord {
                version: version.to_string(),
                installed: false,
                installed_path: None,
            }),
        }
        info!(version, "marked engine uninstalled");
        self.persist()
    }

    /// Record a user-supplied executable as an install of `version`.
    ///
    /// Used for pre-existing local builds that never went through the
    /// download pipeline; enforces the same invariant as
    /// [`mark_installed`](Self::mark_installed).
    pub fn register_manual_install(
        &mut self,
        version: &str,
        executable: impl Into<PathBuf>,
    ) -> StoreResult<()> {
        self.mark_installed(version, executable)
    }

    /// Register a project. Returns its index.
    pub fn add_project(&mut self, project: Project) -> StoreResult<usize> {
        self.projects.push(project);
        self.persist()?;
        Ok(self.projects.len() - 1)
    }

    /// Remove a project from the list. Never deletes project files.
    pub fn remove_project(&mut self, index: usize) -> StoreResult<Project> {
        if index >= self.projects.len() {
            return Err(StoreError::UnknownProject { index });
        }
        let removed = self.projects.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Change the engine version a project is bound to.
    ///
    /// No compatibility check is performed; the surrounding UI is
    /// expected to warn the user before calling this.
    pub fn rebind(&mut self, index: usize, version: &str) -> StoreResult<()> {
        let project = self
            .projects
            .get_mut(index)
            .ok_or(StoreError::UnknownProject { index })?;
        project.engine_version = version.to_string();
        info!(project = %project.name, version, "rebound project");
        self.persist()
    }

    /// Update a project's last-opened date to today.
    pub fn touch_project_opened(&mut self, index: usize) -> StoreResult<()> {
        let project = self
            .projects
            .get_mut(index)
            .ok_or(StoreError::UnknownProject { index })?;
        project.touch_last_opened();
        self.persist()
    }

    /// Set the default directory for new projects.
    pub fn set_default_project_dir(&mut self, dir: impl Into<PathBuf>) -> StoreResult<()> {
        self.settings.default_project_dir = dir.into();
        self.persist()
    }

    /// Set the default directory engine versions install under.
    pub fn set_default_engine_dir(&mut self, dir: impl Into<PathBuf>) -> StoreResult<()> {
        self.settings.default_engine_dir = dir.into();
        self.persist()
    }

    /// Rewrite the backing file from in-memory state.
    ///
    /// The in-memory mutation stays in place even when this fails, so
    /// the caller can show the attempted change alongside the error.
    fn persist(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let text = format::render(&self.settings, &self.engines, &self.projects);
        fs::write(&self.path, text).map_err(|e| StoreError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, InstallationStore) {
        let temp = TempDir::new().unwrap();
        let store = InstallationStore::empty(temp.path().join("store.txt"));
        (temp, store)
    }

    fn assert_invariant(store: &InstallationStore) {
        for record in store.engines() {
            assert!(
                record.is_consistent(),
                "record for {} violates installed-iff-path",
                record.version
            );
        }
    }

    #[test]
    fn test_load_missing_file_is_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = InstallationStore::load(temp.path().join("absent.txt")).unwrap();

        assert!(store.engines().is_empty());
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_load_rejects_installed_record_without_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.txt");
        // Hand-damaged file: installed flag set but no executable path.
        fs::write(&path, "[ENGINES]\n4.3|true|\n4.2.2|false|\n").unwrap();

        let store = InstallationStore::load(&path).unwrap();

        assert!(!store.is_installed("4.3"));
        assert_eq!(store.installed_path("4.3"), None);
        assert_invariant(&store);
    }

    #[test]
    fn test_mark_installed_sets_state_and_persists() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/x/Godot.exe").unwrap();

        assert!(store.is_installed("4.3"));
        assert_eq!(store.installed_path("4.3"), Some(Path::new("/x/Godot.exe")));
        assert_invariant(&store);

        // The persisted file reflects the mutation immediately.
        let reloaded = InstallationStore::load(store.path()).unwrap();
        assert!(reloaded.is_installed("4.3"));
    }

    #[test]
    fn test_mark_installed_is_idempotent() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/x/Godot.exe").unwrap();
        store.mark_installed("4.3", "/x/Godot.exe").unwrap();

        assert_eq!(store.engines().len(), 1);
        assert_eq!(store.installed_path("4.3"), Some(Path::new("/x/Godot.exe")));
        assert_invariant(&store);
    }

    #[test]
    fn test_mark_installed_overwrites_path() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/old/Godot.exe").unwrap();
        store.mark_installed("4.3", "/new/Godot.exe").unwrap();

        assert_eq!(
            store.installed_path("4.3"),
            Some(Path::new("/new/Godot.exe"))
        );
    }

    #[test]
    fn test_mark_uninstalled_clears_path_only() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/x/Godot.exe").unwrap();
        store.mark_uninstalled("4.3").unwrap();

        assert!(!store.is_installed("4.3"));
        assert_eq!(store.installed_path("4.3"), None);
        assert_invariant(&store);
    }

    #[test]
    fn test_uninstall_keeps_stale_project_binding() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/x/Godot.exe").unwrap();
        store
            .add_project(Project::new("Game", "/p/Game", "4.3"))
            .unwrap();
        store.mark_uninstalled("4.3").unwrap();

        assert_eq!(store.project(0).unwrap().engine_version, "4.3");
    }

    #[test]
    fn test_unknown_version_defaults_to_not_installed() {
        let (_temp, store) = temp_store();
        assert!(!store.is_installed("4.3"));
        assert_eq!(store.installed_path("4.3"), None);
    }

    #[test]
    fn test_add_and_remove_project() {
        let (_temp, mut store) = temp_store();

        let index = store
            .add_project(Project::new("Game", "/p/Game", "4.3"))
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(store.projects().len(), 1);

        let removed = store.remove_project(0).unwrap();
        assert_eq!(removed.name, "Game");
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_remove_unknown_project() {
        let (_temp, mut store) = temp_store();
        assert!(matches!(
            store.remove_project(3),
            Err(StoreError::UnknownProject { index: 3 })
        ));
    }

    #[test]
    fn test_rebind_changes_version_without_validation() {
        let (_temp, mut store) = temp_store();

        store
            .add_project(Project::new("Game", "/p/Game", "4.3"))
            .unwrap();
        // "0.0" is not installed and not in any catalog; rebind accepts it.
        store.rebind(0, "0.0").unwrap();

        assert_eq!(store.project(0).unwrap().engine_version, "0.0");
    }

    #[test]
    fn test_settings_persist() {
        let (_temp, mut store) = temp_store();

        store.set_default_engine_dir("/opt/engines").unwrap();
        store.set_default_project_dir("/srv/projects").unwrap();

        let reloaded = InstallationStore::load(store.path()).unwrap();
        assert_eq!(
            reloaded.settings().default_engine_dir,
            PathBuf::from("/opt/engines")
        );
        assert_eq!(
            reloaded.settings().default_project_dir,
            PathBuf::from("/srv/projects")
        );
    }

    #[test]
    fn test_full_round_trip_through_disk() {
        let (_temp, mut store) = temp_store();

        store.mark_installed("4.3", "/x/Godot.exe").unwrap();
        store.mark_uninstalled("3.6").unwrap();
        store
            .add_project(Project::new("Game", "/p/Game", "4.3"))
            .unwrap();

        let reloaded = InstallationStore::load(store.path()).unwrap();
        assert_eq!(reloaded.engines(), store.engines());
        assert_eq!(reloaded.projects(), store.projects());
        assert_eq!(reloaded.settings(), store.settings());
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let temp = TempDir::new().unwrap();
        // Backing "file" is a directory, so every write fails.
        let mut store = InstallationStore::empty(temp.path());

        let result = store.mark_installed("4.3", "/x/Godot.exe");

        assert!(matches!(result, Err(StoreError::WriteFailed { .. })));
        // The in-memory mutation is still visible to the caller.
        assert!(store.is_installed("4.3"));
    }
}
