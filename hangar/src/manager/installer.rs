//! Archive extraction and executable discovery.
//!
//! Release archives are plain zips. Installation extracts every entry
//! into a version-specific directory, then walks the result to identify
//! the engine binary:
//!
//! 1. a top-level file whose name contains the product name and carries
//!    the platform's executable extension,
//! 2. failing that, the same preference applied depth-first through
//!    subdirectories,
//! 3. failing that, any file with the executable extension anywhere.
//!
//! If nothing matches, the install fails and the caller must not mark
//! the version installed. Entries whose paths would escape the
//! destination directory are rejected outright.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::manager::error::{ManagerError, ManagerResult};
use crate::platform::{EXECUTABLE_EXTENSION, PRODUCT_NAME};

/// Extracts release archives and locates the engine binary inside.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    product_name: String,
    executable_extension: String,
}

impl Default for ArchiveInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveInstaller {
    /// Create an installer using the platform defaults.
    pub fn new() -> Self {
        Self {
            product_name: PRODUCT_NAME.to_string(),
            executable_extension: EXECUTABLE_EXTENSION.to_string(),
        }
    }

    /// Override the preferred binary name fragment.
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into().to_lowercase();
        self
    }

    /// Override the executable extension to search for.
    pub fn with_executable_extension(mut self, ext: impl Into<String>) -> Self {
        self.executable_extension = ext.into().to_lowercase();
        self
    }

    /// Extract `archive` into `dest_dir` and locate the engine binary.
    ///
    /// On success the archive file is deleted and the absolute path of
    /// the executable returned. On failure the archive is left in place
    /// so the install can be retried or inspected without downloading
    /// again.
    pub fn install(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<PathBuf> {
        self.extract(archive, dest_dir)?;
        let executable = self.locate_executable(dest_dir)?;

        // Keep the archive only while it might still be needed.
        fs::remove_file(archive).ok();

        info!(
            executable = %executable.display(),
            "engine installed"
        );
        Ok(executable)
    }

    /// Extract every archive entry into `dest_dir`, preserving relative
    /// paths. Returns the number of file entries written.
    pub fn extract(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        let file = File::open(archive).map_err(|e| ManagerError::Disk {
            path: archive.to_path_buf(),
            source: e,
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| ManagerError::ArchiveCorrupt {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })?;

        fs::create_dir_all(dest_dir).map_err(|e| ManagerError::Disk {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let mut files_written = 0;
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| ManagerError::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;

            // enclosed_name rejects absolute paths and `..` components.
            let Some(relative) = entry.enclosed_name() else {
                return Err(ManagerError::ArchiveCorrupt {
                    path: archive.to_path_buf(),
                    reason: format!("entry {:?} escapes the destination directory", entry.name()),
                });
            };
            let out_path = dest_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| ManagerError::Disk {
                    path: out_path.clone(),
                    source: e,
                })?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| ManagerError::Disk {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            let mut out_file = File::create(&out_path).map_err(|e| ManagerError::Disk {
                path: out_path.clone(),
                source: e,
            })?;
            io::copy(&mut entry, &mut out_file).map_err(|e| ManagerError::Disk {
                path: out_path.clone(),
                source: e,
            })?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode)).map_err(|e| {
                    ManagerError::Disk {
                        path: out_path.clone(),
                        source: e,
                    }
                })?;
            }

            files_written += 1;
        }

        debug!(
            archive = %archive.display(),
            files = files_written,
            "archive extracted"
        );
        Ok(files_written)
    }

    /// Locate the engine executable under an extraction directory.
    pub fn locate_executable(&self, dir: &Path) -> ManagerResult<PathBuf> {
        if let Some(found) = self.find_preferred(dir) {
            return Ok(found);
        }
        if let Some(found) = self.find_any(dir) {
            return Ok(found);
        }
        Err(ManagerError::ExecutableNotFound {
            dir: dir.to_path_buf(),
        })
    }

    /// Name-preference search: product name plus executable extension,
    /// top level first, then depth-first into subdirectories.
    fn find_preferred(&self, dir: &Path) -> Option<PathBuf> {
        let entries = read_dir_sorted(dir)?;

        for path in &entries {
            if path.is_file() && self.has_extension(path) && self.has_product_name(path) {
                return Some(path.clone());
            }
        }

        for path in &entries {
            if path.is_dir() {
                if let Some(found) = self.find_preferred(path) {
                    return Some(found);
                }
            }
        }

        None
    }

    /// Fallback search: any file carrying the executable extension.
    fn find_any(&self, dir: &Path) -> Option<PathBuf> {
        let entries = read_dir_sorted(dir)?;

        for path in &entries {
            if path.is_file() && self.has_extension(path) {
                return Some(path.clone());
            }
        }

        for path in &entries {
            if path.is_dir() {
                if let Some(found) = self.find_any(path) {
                    return Some(found);
                }
            }
        }

        None
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.executable_extension))
    }

    fn has_product_name(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.to_lowercase().contains(&self.product_name))
    }
}

/// List a directory's entries in name order so discovery is
/// deterministic across filesystems.
fn read_dir_sorted(dir: &Path) -> Option<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn test_installer() -> ArchiveInstaller {
        ArchiveInstaller::new()
            .with_product_name("godot")
            .with_executable_extension("exe")
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for (name, contents) in entries {
            if name.ends_with('/') {
                zip.add_directory(name.trim_end_matches('/'), options)
                    .unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(contents).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_recreates_layout() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("engine.zip");
        write_zip(
            &archive,
            &[
                ("readme.txt", b"hello".as_slice()),
                ("tools/", b"".as_slice()),
                ("tools/helper.dat", b"data".as_slice()),
            ],
        );

        let dest = temp.path().join("out");
        let count = test_installer().extract(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert!(dest.join("readme.txt").is_file());
        assert!(dest.join("tools").is_dir());
        assert!(dest.join("tools/helper.dat").is_file());
    }

    #[test]
    fn test_extract_creates_missing_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("engine.zip");
        // File entry with no preceding directory entry.
        write_zip(&archive, &[("a/b/c.txt", b"x".as_slice())]);

        let dest = temp.path().join("out");
        test_installer().extract(&archive, &dest).unwrap();

        assert!(dest.join("a/b/c.txt").is_file());
    }

    #[test]
    fn test_extract_rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"x".as_slice())]);

        let dest = temp.path().join("out");
        let result = test_installer().extract(&archive, &dest);

        assert!(matches!(result, Err(ManagerError::ArchiveCorrupt { .. })));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_rejects_garbage_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("not-a.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let result = test_installer().extract(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ManagerError::ArchiveCorrupt { .. })));
    }

    #[test]
    fn test_locate_prefers_named_executable_at_top_level() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("uninstaller.exe"), b"x").unwrap();
        fs::write(temp.path().join("Godot_v4.3-stable.exe"), b"x").unwrap();

        let found = test_installer().locate_executable(temp.path()).unwrap();
        assert_eq!(found, temp.path().join("Godot_v4.3-stable.exe"));
    }

    #[test]
    fn test_locate_recurses_into_subdirectories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("bin").join("win64");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("godot.exe"), b"x").unwrap();

        let found = test_installer().locate_executable(temp.path()).unwrap();
        assert_eq!(found, nested.join("godot.exe"));
    }

    #[test]
    fn test_locate_falls_back_to_any_executable() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("tools");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("editor.exe"), b"x").unwrap();
        fs::write(temp.path().join("notes.txt"), b"x").unwrap();

        let found = test_installer().locate_executable(temp.path()).unwrap();
        assert_eq!(found, nested.join("editor.exe"));
    }

    #[test]
    fn test_locate_matches_name_case_insensitively() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("GODOT.EXE"), b"x").unwrap();

        let found = test_installer().locate_executable(temp.path()).unwrap();
        assert_eq!(found, temp.path().join("GODOT.EXE"));
    }

    #[test]
    fn test_locate_nothing_found() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("readme.txt"), b"x").unwrap();

        let result = test_installer().locate_executable(temp.path());
        assert!(matches!(
            result,
            Err(ManagerError::ExecutableNotFound { .. })
        ));
    }

    #[test]
    fn test_install_deletes_archive_on_success() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("engine.zip");
        write_zip(&archive, &[("Godot_v4.3.exe", b"binary".as_slice())]);

        let dest = temp.path().join("4.3");
        let exe = test_installer().install(&archive, &dest).unwrap();

        assert_eq!(exe, dest.join("Godot_v4.3.exe"));
        assert!(!archive.exists());
    }

    #[test]
    fn test_install_keeps_archive_on_failure() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("engine.zip");
        write_zip(&archive, &[("readme.txt", b"no binary here".as_slice())]);

        let dest = temp.path().join("4.3");
        let result = test_installer().install(&archive, &dest);

        assert!(matches!(
            result,
            Err(ManagerError::ExecutableNotFound { .. })
        ));
        // Left in place for diagnosis and retry without re-downloading.
        assert!(archive.exists());
    }
}
