//! Engine version lifecycle management.
//!
//! The [`EngineManager`] drives the whole install pipeline for a
//! version: fetch the release archive, extract it, locate the engine
//! binary, record the install in the store. It also resolves and
//! launches registered projects, and lists catalog entries overlaid
//! with their install state.
//!
//! Pipelines run on plain threads; the blocking HTTP client keeps the
//! whole pipeline synchronous within its thread. Cancellation flows
//! through a [`CancellationToken`] checked between download chunks and
//! between phases. Two pipelines for different versions may run
//! concurrently; a second pipeline for the same version is rejected
//! while the first is in flight.

pub mod error;
pub mod fetch;
pub mod installer;
pub mod launcher;
pub mod resolver;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{Catalog, EngineRelease};
use crate::store::SharedStore;

pub use error::{ManagerError, ManagerResult};
pub use fetch::{FetchProgressCallback, HttpFetcher};
pub use installer::ArchiveInstaller;
pub use resolver::{resolve, ResolveError};

/// Phase an install pipeline is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Streaming the release archive to disk.
    Download,
    /// Unpacking the archive into the version directory.
    Extract,
    /// Searching the extracted tree for the engine binary.
    Locate,
    /// The install is recorded and ready to use.
    Complete,
}

impl PipelinePhase {
    /// Human-readable phase name for progress displays.
    pub fn name(&self) -> &'static str {
        match self {
            PipelinePhase::Download => "downloading",
            PipelinePhase::Extract => "extracting",
            PipelinePhase::Locate => "locating executable",
            PipelinePhase::Complete => "complete",
        }
    }
}

/// Progress callback for an install pipeline: `(phase, fraction)`.
///
/// `fraction` is in `0.0..=1.0` when known, `None` when the phase has
/// no measurable progress (extraction, or a download without a
/// Content-Length).
pub type PipelineProgressCallback = Box<dyn Fn(PipelinePhase, Option<f64>) + Send + Sync>;

/// A catalog entry overlaid with its current install state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineListing {
    /// The catalog release this listing describes.
    pub release: EngineRelease,

    /// Whether the version is currently marked installed.
    pub installed: bool,

    /// Recorded executable path, when installed.
    pub installed_path: Option<PathBuf>,
}

/// Handle to an install pipeline running on a background thread.
pub struct PipelineHandle {
    version: String,
    cancel: CancellationToken,
    thread: JoinHandle<ManagerResult<PathBuf>>,
}

impl PipelineHandle {
    /// Version this pipeline is installing.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Request cancellation. Takes effect at the next chunk or phase
    /// boundary; [`wait`](Self::wait) then returns
    /// [`ManagerError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The pipeline's cancellation token, for wiring into signal
    /// handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Block until the pipeline finishes and return its outcome.
    pub fn wait(self) -> ManagerResult<PathBuf> {
        self.thread
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e))
    }
}

/// Orchestrates engine installs, uninstalls, listings and project
/// launches against a shared store.
#[derive(Clone)]
pub struct EngineManager {
    catalog: Arc<Catalog>,
    store: SharedStore,
    fetcher: HttpFetcher,
    installer: ArchiveInstaller,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl EngineManager {
    /// Create a manager over a catalog and shared store, with default
    /// fetcher and installer.
    pub fn new(catalog: Catalog, store: SharedStore) -> Self {
        Self::with_components(catalog, store, HttpFetcher::new(), ArchiveInstaller::new())
    }

    /// Create a manager with explicit fetcher and installer, mostly for
    /// tests pointing at a local server.
    pub fn with_components(
        catalog: Catalog,
        store: SharedStore,
        fetcher: HttpFetcher,
        installer: ArchiveInstaller,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            fetcher,
            installer,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The release catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The shared store handle.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// All catalog releases overlaid with their install state.
    pub fn engines(&self) -> Vec<EngineListing> {
        let store = self.store.lock();
        self.catalog
            .releases()
            .iter()
            .map(|release| EngineListing {
                release: release.clone(),
                installed: store.is_installed(&release.version),
                installed_path: store.installed_path(&release.version).map(PathBuf::from),
            })
            .collect()
    }

    /// Only the releases currently marked installed, in catalog order.
    pub fn installed_engines(&self) -> Vec<EngineListing> {
        self.engines()
            .into_iter()
            .filter(|listing| listing.installed)
            .collect()
    }

    /// Run the install pipeline for a version on the calling thread.
    ///
    /// Returns the path of the installed executable. Fails fast when
    /// the version is unknown, already installed, or already being
    /// installed by another pipeline. On failure the version directory
    /// is removed but the downloaded archive is kept, so a retry can
    /// skip the download; cancellation removes both. The store is left
    /// untouched in either case.
    pub fn install(
        &self,
        version: &str,
        cancel: &CancellationToken,
        progress: Option<PipelineProgressCallback>,
    ) -> ManagerResult<PathBuf> {
        let release = self
            .catalog
            .lookup(version)
            .ok_or_else(|| ManagerError::UnknownVersion {
                version: version.to_string(),
            })?
            .clone();

        let engine_root = {
            let store = self.store.lock();
            if store.is_installed(version) {
                return Err(ManagerError::AlreadyInstalled {
                    version: version.to_string(),
                });
            }
            store.settings().default_engine_dir.clone()
        };

        let _guard = InFlightGuard::acquire(&self.in_flight, version).ok_or_else(|| {
            ManagerError::InstallInProgress {
                version: version.to_string(),
            }
        })?;

        let archive = engine_root.join(format!("godot-{version}.zip.part"));
        let dest_dir = engine_root.join(version);

        let result = self.run_pipeline(&release, &archive, &dest_dir, cancel, progress);
        if let Err(ref error) = result {
            // Cancellation keeps nothing; other failures keep the
            // archive so a retry or inspection can skip the download.
            if matches!(error, ManagerError::Cancelled) {
                fs::remove_file(&archive).ok();
            }
            if fs::remove_dir_all(&dest_dir).is_ok() {
                warn!(version, "removed incomplete install directory");
            }
        }
        result
    }

    fn run_pipeline(
        &self,
        release: &EngineRelease,
        archive: &std::path::Path,
        dest_dir: &std::path::Path,
        cancel: &CancellationToken,
        progress: Option<PipelineProgressCallback>,
    ) -> ManagerResult<PathBuf> {
        let version = release.version.as_str();
        let progress = progress.map(Arc::new);
        info!(version, url = %release.download_url, "starting install pipeline");

        let fetch_progress: Option<FetchProgressCallback> = progress.as_ref().map(|cb| {
            let cb = Arc::clone(cb);
            Box::new(move |downloaded: u64, total: Option<u64>| {
                let fraction = total.filter(|t| *t > 0).map(|t| downloaded as f64 / t as f64);
                cb(PipelinePhase::Download, fraction);
            }) as FetchProgressCallback
        });
        self.fetcher
            .fetch(&release.download_url, archive, cancel, fetch_progress)?;

        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        if let Some(ref cb) = progress {
            cb(PipelinePhase::Extract, None);
        }
        self.installer.extract(archive, dest_dir)?;

        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        if let Some(ref cb) = progress {
            cb(PipelinePhase::Locate, None);
        }
        let executable = self.installer.locate_executable(dest_dir)?;

        self.store.lock().mark_installed(version, &executable)?;

        // The archive has served its purpose once the install is
        // recorded; until then it stays for retry.
        fs::remove_file(archive).ok();

        if let Some(ref cb) = progress {
            cb(PipelinePhase::Complete, Some(1.0));
        }
        info!(version, executable = %executable.display(), "install pipeline finished");
        Ok(executable)
    }

    /// Run the install pipeline on a background thread.
    ///
    /// The returned handle cancels or joins the pipeline; dropping it
    /// detaches the pipeline, which runs to completion on its own.
    pub fn install_in_background(
        &self,
        version: &str,
        progress: Option<PipelineProgressCallback>,
    ) -> PipelineHandle {
        let cancel = CancellationToken::new();
        let manager = self.clone();
        let worker_cancel = cancel.clone();
        let worker_version = version.to_string();

        let thread = thread::spawn(move || {
            manager.install(&worker_version, &worker_cancel, progress)
        });

        PipelineHandle {
            version: version.to_string(),
            cancel,
            thread,
        }
    }

    /// Record a user-supplied executable as an install of `version`.
    ///
    /// The version must exist in the catalog; the executable path is
    /// recorded as given and verified at open-time by the resolver.
    pub fn register_manual_install(
        &self,
        version: &str,
        executable: impl Into<PathBuf>,
    ) -> ManagerResult<()> {
        if self.catalog.lookup(version).is_none() {
            return Err(ManagerError::UnknownVersion {
                version: version.to_string(),
            });
        }
        self.store
            .lock()
            .register_manual_install(version, executable)?;
        Ok(())
    }

    /// Mark a version uninstalled.
    ///
    /// Bookkeeping only: the installed files stay on disk and projects
    /// bound to the version keep their binding.
    pub fn uninstall(&self, version: &str) -> ManagerResult<()> {
        self.store.lock().mark_uninstalled(version)?;
        Ok(())
    }

    /// Resolve and launch the project at `index`, then record the open.
    ///
    /// The last-opened date is only updated after a successful spawn.
    pub fn open_project(&self, index: usize) -> ManagerResult<()> {
        let mut store = self.store.lock();
        let project = store
            .project(index)
            .cloned()
            .ok_or(crate::store::StoreError::UnknownProject { index })?;

        let executable = resolver::resolve(&project, &store)?;
        launcher::launch(&executable, &project.root)?;
        store.touch_project_opened(index)?;
        Ok(())
    }
}

/// Membership in the set of versions currently being installed.
///
/// Dropping the guard releases the version, including on panic or
/// early return from the pipeline.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    version: String,
}

impl InFlightGuard {
    /// Claim `version`, or `None` if a pipeline already holds it.
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, version: &str) -> Option<Self> {
        if !set.lock().insert(version.to_string()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            version: version.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.version);
    }
}
