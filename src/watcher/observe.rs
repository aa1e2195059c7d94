//! Single observation step: stat, hash, and change classification.
//!
//! Everything here is side-effect-free with respect to watcher state; the
//! polling loop applies the returned [`Observation`].

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use super::error::{ErrorKind, ErrorState, WatchError};

/// Size of the content digest in bytes (SHA-256).
pub const DIGEST_LEN: usize = 32;

/// Baseline for change detection: last observed mtime plus content digest.
///
/// The digest exists purely to detect change; it is not an integrity or
/// security primitive and must not be reused as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    modified: SystemTime,
    digest: [u8; DIGEST_LEN],
}

impl Fingerprint {
    /// Stat and fully read the file, producing its current fingerprint.
    ///
    /// This is the synchronous baseline read used by watcher construction:
    /// exactly one full read, errors mapped to construction errors.
    pub fn capture(path: &Path) -> Result<Self, WatchError> {
        let stat = fs::symlink_metadata(path).map_err(|e| {
            if e.kind() == IoErrorKind::NotFound {
                WatchError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                WatchError::StatFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let modified = stat.modified().map_err(|e| WatchError::StatFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let content = fs::read(path).map_err(|e| WatchError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            modified,
            digest: digest_of(&content),
        })
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Same fingerprint with an updated mtime (mtime-only churn commit).
    pub fn with_modified(self, modified: SystemTime) -> Self {
        Self { modified, ..self }
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.digest {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Outcome of one observation of the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Modification time matches the baseline; nothing to do.
    Unchanged,
    /// Modification time moved but content is byte-identical (e.g. `touch`).
    /// Commit the new mtime without reporting a change.
    Touched(SystemTime),
    /// Content differs from the baseline; commit the new fingerprint.
    Modified(Fingerprint),
    /// The observation failed with the given classification.
    Failed(ErrorState),
}

/// Observe the file once and classify the result against `baseline`.
///
/// Stat failures: nonexistence is fatal (`FileNotExist`), anything else is
/// assumed transient (`FileLost`). Read failures after a detected mtime move:
/// a file that cannot be opened at all is fatal (`OpenFailed`), other I/O
/// errors are transient (`ProcessingFailed`).
pub fn check(path: &Path, baseline: &Fingerprint) -> Observation {
    let stat = match fs::symlink_metadata(path) {
        Ok(stat) => stat,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Observation::Failed(ErrorState::new(ErrorKind::FileNotExist));
        }
        Err(_) => {
            return Observation::Failed(ErrorState::new(ErrorKind::FileLost));
        }
    };

    let modified = match stat.modified() {
        Ok(time) => time,
        Err(_) => {
            return Observation::Failed(ErrorState::new(ErrorKind::ProcessingFailed));
        }
    };

    if modified == baseline.modified() {
        return Observation::Unchanged;
    }

    // Mtime moved: re-read and compare content.
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::PermissionDenied) => {
            return Observation::Failed(ErrorState::new(ErrorKind::OpenFailed));
        }
        Err(_) => {
            return Observation::Failed(ErrorState::new(ErrorKind::ProcessingFailed));
        }
    };

    let digest = digest_of(&content);
    if digest == *baseline.digest() {
        Observation::Touched(modified)
    } else {
        Observation::Modified(Fingerprint { modified, digest })
    }
}

fn digest_of(content: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.finalize().into()
}
