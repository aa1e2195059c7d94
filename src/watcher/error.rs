//! Error types for the file watcher.
//!
//! Two layers: [`WatchError`] for synchronous construction failures that
//! propagate to the caller, and [`ErrorState`] values that the polling loop
//! accumulates in its [`ErrorStack`](super::ErrorStack) while observing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned synchronously from watcher construction.
///
/// Polling-time failures never surface through this type; they flow through
/// the state channel and the error stack instead.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to open {path} for reading: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read metadata for {path}: {source}")]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Classification of an observation failure.
///
/// Each kind carries a fixed recoverable flag: recoverable kinds accumulate
/// and may resolve on a later successful observation; fatal kinds terminate
/// the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be opened for reading.
    OpenFailed,
    /// A stat or open attempt failed but may be transient.
    FileLost,
    /// The file no longer exists at the watched path.
    FileNotExist,
    /// Hashing or comparison failed mid-observation.
    ProcessingFailed,
}

impl ErrorKind {
    /// Whether this kind allows the loop to keep observing.
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::FileLost | ErrorKind::ProcessingFailed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OpenFailed => "open failed",
            ErrorKind::FileLost => "file lost",
            ErrorKind::FileNotExist => "file no longer exists",
            ErrorKind::ProcessingFailed => "processing failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded observation error: a kind plus its recoverable flag.
///
/// Immutable value; the flag is derived from the kind at construction so the
/// two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorState {
    kind: ErrorKind,
    recoverable: bool,
}

impl ErrorState {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            recoverable: kind.is_recoverable(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

impl From<ErrorKind> for ErrorState {
    fn from(kind: ErrorKind) -> Self {
        ErrorState::new(kind)
    }
}

impl std::fmt::Display for ErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}
