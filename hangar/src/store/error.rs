//! Error types for the installation store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading or persisting the store.
///
/// A persist failure does not roll back the in-memory mutation that
/// triggered it; callers surface the error so the user knows the change
/// did not reach disk.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the store file.
    #[error("failed to read store file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write the store file.
    #[error("failed to write store file {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A project index did not refer to a registered project.
    #[error("no project at index {index}")]
    UnknownProject { index: usize },
}
