//! Single-file change monitor.
//!
//! Polls one file on an interval and reports content or availability changes
//! through a state machine published on a latest-wins channel. See
//! [`watcher::FileWatcher`] for the entry point.

pub mod logging;
pub mod watcher;

pub use watcher::{
    DEFAULT_FAULT_THRESHOLD, DIGEST_LEN, ErrorKind, ErrorStack, ErrorState, FileWatcher,
    Fingerprint, Observation, State, WatchError, check,
};
