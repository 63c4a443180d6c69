//! Custom error types and result handling for Tojiru operations.
//!
//! Every operation returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Errors that refer to the file system carry
//! the offending path next to the underlying cause, and every variant maps to
//! one coarse [`ErrorKind`] via [`Error::kind`] for callers that only need to
//! branch on the category of a failure.
//!
use std::path::{Path, PathBuf};

/// Type alias for Results with Tojiru errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// A required path does not exist or could not be listed.
    NotFound,
    /// A directory was expected but something else was found.
    NotADirectory,
    /// The destination exists and overwriting was not allowed.
    AlreadyExists,
    /// A source entry could not be read or decoded.
    ReadFailure,
    /// The destination could not be written or finalized.
    WriteFailure,
    /// Invalid configuration.
    Config,
    /// Anything else (runtime failures, ad-hoc messages).
    Other,
}

/// Comprehensive error type for all Tojiru operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A path that must exist is missing or unreadable
    #[error("Not found: '{}': {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Expected a directory, found a file or something else
    #[error("Not a directory: '{}'", .0.display())]
    NotADirectory(PathBuf),
    /// Destination already present and overwrite is disabled
    #[error("Destination already exists: '{}'", .0.display())]
    AlreadyExists(PathBuf),
    /// Reading a source entry failed
    #[error("Failed to read '{}': {source}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing or finalizing the destination failed
    #[error("Failed to write '{}': {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file at the path is not a readable ZIP container, or an entry is corrupt
    #[error("Invalid archive '{}': {source}", .path.display())]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    /// Two pages would be stored under the same entry name
    #[error("Duplicate archive entry name: '{0}'")]
    DuplicateEntry(String),
    /// Image decoding or encoding errors during normalization
    #[error("Failed to transcode '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// I/O errors from the standard library that have no better classification
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error for failed asynchronous tasks (e.g., a panicked blocking task)
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    #[error(transparent)]
    TojiruBuilder(#[from] crate::tojiru::TojiruConfigBuilderError),
    /// Configuration rejected by a preflight check
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::NotADirectory(_) => ErrorKind::NotADirectory,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::ReadFailure { .. } | Error::InvalidArchive { .. } | Error::Image { .. } => {
                ErrorKind::ReadFailure
            }
            Error::WriteFailure { .. } | Error::DuplicateEntry(_) => ErrorKind::WriteFailure,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                _ => ErrorKind::Other,
            },
            Error::TojiruBuilder(_) | Error::Config(_) => ErrorKind::Config,
            Error::AsyncTaskError(_) | Error::Other(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn not_found(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::NotFound {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::ReadFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::WriteFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
