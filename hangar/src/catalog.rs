//! Catalog of known engine releases.
//!
//! The catalog is a read-only table seeded at process start: version
//! label, advisory download size, and release-asset URL. It carries no
//! install state; whether a version is installed (and where) lives in
//! the [`InstallationStore`](crate::store::InstallationStore) and is
//! overlaid onto catalog entries by the manager when listing.

use crate::platform::RELEASE_ASSET_SUFFIX;

/// One downloadable engine build known to the catalog.
///
/// # Example
///
/// ```
/// use hangar::catalog::Catalog;
///
/// let catalog = Catalog::builtin();
/// let release = catalog.lookup("4.3").unwrap();
///
/// assert_eq!(release.version, "4.3");
/// assert!(release.download_url.ends_with(".zip"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRelease {
    /// Version label, unique within the catalog (e.g. "4.3").
    pub version: String,

    /// Advisory download size for display only (e.g. "95 MB").
    pub size: String,

    /// URL of the release archive for the current platform.
    pub download_url: String,
}

impl EngineRelease {
    /// Create a release entry pointing at the official release asset
    /// for this platform.
    fn stable(version: &str, size: &str) -> Self {
        let download_url = format!(
            "https://github.com/godotengine/godot/releases/download/{v}-stable/Godot_v{v}-stable_{suffix}",
            v = version,
            suffix = RELEASE_ASSET_SUFFIX,
        );
        Self {
            version: version.to_string(),
            size: size.to_string(),
            download_url,
        }
    }
}

/// Read-only table of known engine releases.
#[derive(Debug, Clone)]
pub struct Catalog {
    releases: Vec<EngineRelease>,
}

impl Catalog {
    /// The built-in release table, newest first.
    pub fn builtin() -> Self {
        Self {
            releases: vec![
                EngineRelease::stable("4.5", "103 MB"),
                EngineRelease::stable("4.4.1", "100 MB"),
                EngineRelease::stable("4.4", "100 MB"),
                EngineRelease::stable("4.3", "95 MB"),
                EngineRelease::stable("4.2.2", "92 MB"),
                EngineRelease::stable("4.2.1", "91 MB"),
                EngineRelease::stable("4.1.4", "88 MB"),
                EngineRelease::stable("4.1.3", "88 MB"),
                EngineRelease::stable("3.6.1", "45 MB"),
                EngineRelease::stable("3.6", "45 MB"),
                EngineRelease::stable("3.5.3", "44 MB"),
            ],
        }
    }

    /// Build a catalog from an explicit release list.
    ///
    /// Mostly useful for tests; production code uses [`Catalog::builtin`].
    pub fn from_releases(releases: Vec<EngineRelease>) -> Self {
        Self { releases }
    }

    /// Look up a release by its exact version label.
    pub fn lookup(&self, version: &str) -> Option<&EngineRelease> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// All known releases, in catalog order.
    pub fn releases(&self) -> &[EngineRelease] {
        &self.releases
    }

    /// Number of known releases.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_seeded() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.len(), 11);
    }

    #[test]
    fn test_lookup_known_version() {
        let catalog = Catalog::builtin();
        let release = catalog.lookup("4.3").unwrap();

        assert_eq!(release.version, "4.3");
        assert_eq!(release.size, "95 MB");
        assert!(release
            .download_url
            .starts_with("https://github.com/godotengine/godot/releases/download/4.3-stable/"));
    }

    #[test]
    fn test_lookup_unknown_version() {
        let catalog = Catalog::builtin();
        assert!(catalog.lookup("99.9").is_none());
    }

    #[test]
    fn test_lookup_is_exact_match_only() {
        let catalog = Catalog::builtin();
        // "4.4" and "4.4.1" are distinct entries; no prefix matching.
        assert!(catalog.lookup("4.4").is_some());
        assert!(catalog.lookup("4.4.1").is_some());
        assert!(catalog.lookup("4.4.2").is_none());
    }

    #[test]
    fn test_version_labels_are_unique() {
        let catalog = Catalog::builtin();
        let mut labels: Vec<_> = catalog.releases().iter().map(|r| &r.version).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), catalog.len());
    }

    #[test]
    fn test_from_releases() {
        let catalog = Catalog::from_releases(vec![EngineRelease {
            version: "1.0".to_string(),
            size: "1 MB".to_string(),
            download_url: "http://localhost/engine.zip".to_string(),
        }]);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup("1.0").is_some());
    }
}
