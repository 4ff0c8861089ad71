//! Error types for nimptool.
//!
//! Every failure the tool can report is a variant of [`Error`]. Each variant
//! belongs to an [`ErrorCategory`], which is what the binary turns into an
//! exit code:
//!
//! ```text
//! usage     -> 2   (bad pid token)
//! identity  -> 1   (passwd / group database failures)
//! io        -> 1   (open, chdir, read)
//! ```

use std::io;
use thiserror::Error;

/// Result type alias for nimptool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed caller input.
    Usage,
    /// User or group database access.
    Identity,
    /// Filesystem access.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Usage => write!(f, "usage"),
            ErrorCategory::Identity => write!(f, "identity"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for nimptool.
#[derive(Error, Debug)]
pub enum Error {
    /// A command-line pid is not a canonical decimal 16-bit value.
    #[error("invalid pid: {token:?}")]
    InvalidPid { token: String },

    #[error("passwd: no entry for uid {uid}")]
    NoSuchUser { uid: u32 },

    #[error("passwd: {0}")]
    IdentityLookupFailed(#[source] io::Error),

    #[error("getgroups: {0}")]
    GroupEnumerationFailed(#[source] io::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the operation (and usually the path) that failed.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the error category for grouping and exit code mapping.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidPid { .. } => ErrorCategory::Usage,
            Error::NoSuchUser { .. }
            | Error::IdentityLookupFailed(_)
            | Error::GroupEnumerationFailed(_) => ErrorCategory::Identity,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// The underlying OS error, if there is one.
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            Error::IdentityLookupFailed(e) | Error::GroupEnumerationFailed(e) => Some(e),
            Error::Io { source, .. } => Some(source),
            Error::InvalidPid { .. } | Error::NoSuchUser { .. } => None,
        }
    }
}
