//! Platform-specific naming for engine binaries and release assets.
//!
//! Godot publishes one archive per platform on each release; the asset
//! suffix and the extension carried by the runnable binary inside it
//! differ per target. Everything else in the library is platform-neutral
//! and goes through these constants.

/// Name fragment that identifies the engine binary inside an archive.
///
/// Matched case-insensitively during executable discovery.
pub const PRODUCT_NAME: &str = "godot";

/// File extension carried by the engine executable on this platform.
#[cfg(target_os = "windows")]
pub const EXECUTABLE_EXTENSION: &str = "exe";

/// File extension carried by the engine executable on this platform.
#[cfg(target_os = "linux")]
pub const EXECUTABLE_EXTENSION: &str = "x86_64";

/// File extension carried by the engine executable on this platform.
#[cfg(target_os = "macos")]
pub const EXECUTABLE_EXTENSION: &str = "universal";

/// Release-asset suffix for this platform (e.g. `win64.exe.zip`).
#[cfg(target_os = "windows")]
pub const RELEASE_ASSET_SUFFIX: &str = "win64.exe.zip";

/// Release-asset suffix for this platform (e.g. `win64.exe.zip`).
#[cfg(target_os = "linux")]
pub const RELEASE_ASSET_SUFFIX: &str = "linux.x86_64.zip";

/// Release-asset suffix for this platform (e.g. `win64.exe.zip`).
#[cfg(target_os = "macos")]
pub const RELEASE_ASSET_SUFFIX: &str = "macos.universal.zip";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_suffix_is_a_zip() {
        assert!(RELEASE_ASSET_SUFFIX.ends_with(".zip"));
    }

    #[test]
    fn test_executable_extension_has_no_dot() {
        assert!(!EXECUTABLE_EXTENSION.contains('.'));
    }
}
