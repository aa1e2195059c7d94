//! Single-file change monitoring by polling.
//!
//! One [`FileWatcher`] owns one file's identity (path, last known mtime,
//! last known content digest), re-observes it on an interval, and publishes
//! [`State`] transitions on a capacity-1 latest-wins channel.
//!
//! # Architecture
//!
//! ```text
//! FileWatcher
//!   - baseline Fingerprint (mtime + SHA-256 digest)
//!   - ErrorStack of observation errors
//!   - one polling task, cancellable
//!         |
//!         v
//!   watch::Receiver<State>   (edge-triggered, latest wins)
//! ```
//!
//! Change detection is mtime-first: an unchanged modification time skips the
//! content read entirely; a moved mtime triggers a re-read and digest
//! comparison, so `touch` without an edit never reports a change.

mod error;
mod observe;
mod single;
mod stack;
mod state;

pub use error::{ErrorKind, ErrorState, WatchError};
pub use observe::{DIGEST_LEN, Fingerprint, Observation, check};
pub use single::{DEFAULT_FAULT_THRESHOLD, FileWatcher};
pub use stack::ErrorStack;
pub use state::State;
