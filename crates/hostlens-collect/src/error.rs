//! Collection errors.

use thiserror::Error;

/// A poll or snapshot cycle failed to enumerate OS state.
///
/// None of these are fatal: snapshot callers degrade to an empty
/// sequence, monitor callers log and retry next cycle.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("permission denied reading {path}")]
    PermissionDenied { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{what} is not supported on this platform")]
    Unsupported { what: &'static str },
}

impl CollectError {
    pub(crate) fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Whether the failure was a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}
