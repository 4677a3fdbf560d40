//! Error types for memocache

use std::fmt;
use std::io;

/// Result type alias for memocache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the cache and its sibling utilities
#[derive(Debug)]
pub enum Error {
    /// Strict lookup of a key that is not cached
    ///
    /// Holds the key rendered with `Debug`, so string keys keep their quotes:
    /// `Unable to find key: "ghost"`.
    KeyNotFound(String),

    /// No `<NAME>_DIR` environment variable for the package
    PackageNotFound(String),

    /// I/O error while writing a request log
    Io(io::Error),
}

impl Error {
    /// Whether this is one of the "not found" lookup errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_) | Error::PackageNotFound(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound(key) => write!(f, "Unable to find key: {}", key),
            Error::PackageNotFound(name) => write!(f, "Package {} not found", name),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
