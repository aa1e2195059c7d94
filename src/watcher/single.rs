//! The file watcher: construction, polling loop, and control surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::error::{ErrorKind, WatchError};
use super::observe::{self, Fingerprint, Observation};
use super::stack::ErrorStack;
use super::state::State;

/// Default number of consecutive ticks producing the same recoverable error
/// before the loop gives up and transitions to [`State::Fault`].
pub const DEFAULT_FAULT_THRESHOLD: u32 = 5;

/// Fields mutated by the polling loop.
///
/// The loop task is the sole writer once started; accessors take read locks.
#[derive(Debug)]
struct Inner {
    state: State,
    fingerprint: Fingerprint,
    errors: ErrorStack,
}

/// Watches a single file for content changes by polling.
///
/// Construction performs one synchronous baseline read (stat plus full
/// content hash). [`start`](FileWatcher::start) spawns the polling loop,
/// which re-observes the file every interval, accumulates observation errors,
/// and publishes state transitions on a latest-wins channel obtained via
/// [`subscribe`](FileWatcher::subscribe). A consumer observing a terminal
/// state (`Fault` or `Panic`) must treat the watcher as dead and construct a
/// new one to keep monitoring.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use filewatch::{FileWatcher, State};
///
/// # async fn demo() -> Result<(), filewatch::WatchError> {
/// let mut watcher = FileWatcher::new("config.toml", Duration::from_secs(2))?;
/// let mut states = watcher.subscribe();
/// watcher.start();
///
/// while states.changed().await.is_ok() {
///     let state = *states.borrow_and_update();
///     if state == State::Changed {
///         println!("config.toml changed");
///     }
///     if state.is_terminal() {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    interval: Duration,
    fault_threshold: u32,
    inner: Arc<RwLock<Inner>>,
    state_tx: watch::Sender<State>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Create a watcher with a synchronous baseline read.
    ///
    /// Stats the path, reads the entire content once, and stores the
    /// resulting fingerprint. Fails without producing a watcher when the
    /// path does not resolve or the file cannot be opened. The polling loop
    /// is not started; state begins as [`State::Stopped`].
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Result<Self, WatchError> {
        let path = path.into();
        let fingerprint = Fingerprint::capture(&path)?;
        let (state_tx, _) = watch::channel(State::Stopped);

        Ok(Self {
            path,
            interval,
            fault_threshold: DEFAULT_FAULT_THRESHOLD,
            inner: Arc::new(RwLock::new(Inner {
                state: State::Stopped,
                fingerprint,
                errors: ErrorStack::new(),
            })),
            state_tx,
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    /// Override the fault threshold (consecutive same-kind recoverable-error
    /// ticks before the loop halts in [`State::Fault`]). Clamped to at
    /// least 1.
    pub fn with_fault_threshold(mut self, threshold: u32) -> Self {
        self.fault_threshold = threshold.max(1);
        self
    }

    /// Start the polling loop.
    ///
    /// No-op if the loop is already running or the watcher was stopped; a
    /// stopped watcher is not resumable.
    pub fn start(&mut self) {
        if self.task.is_some() || self.cancel.is_cancelled() {
            return;
        }

        let watch_loop = WatchLoop {
            path: self.path.clone(),
            interval: self.interval,
            fault_threshold: self.fault_threshold,
            inner: Arc::clone(&self.inner),
            state_tx: self.state_tx.clone(),
            cancel: self.cancel.clone(),
        };

        crate::debug_event!("watcher", "starting", "{}", self.path.display());
        self.task = Some(tokio::spawn(watch_loop.run()));
    }

    /// Signal the loop to stop.
    ///
    /// Idempotent, and safe to call before [`start`](FileWatcher::start).
    /// Cancellation is cooperative: it takes effect between ticks, with at
    /// most one interval of latency, after which the loop publishes
    /// [`State::Stopped`] and exits.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Subscribe to state transitions.
    ///
    /// The channel holds a single slot: a new transition overwrites an
    /// unread one, so consumers always see the latest state but may miss
    /// intermediate ones. Publication is edge-triggered; an unchanged state
    /// is never re-sent.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state_tx.subscribe()
    }

    /// Whether the polling loop task is currently live.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn fault_threshold(&self) -> u32 {
        self.fault_threshold
    }

    /// Current state as last committed by the loop.
    ///
    /// State classification sees the error stack as it stood entering the
    /// tick, while a successful observation resolves the stack in the same
    /// commit. So for one interval after recovery this may still report
    /// [`State::Errors`] (or [`State::ErrorsChanged`]) while
    /// [`errors`](FileWatcher::errors) is already empty; the next tick
    /// reconciles the two.
    pub async fn state(&self) -> State {
        self.inner.read().await.state
    }

    /// Snapshot of the accumulated error stack.
    ///
    /// Empties on the first successful observation after a run of
    /// recoverable errors, one tick before [`state`](FileWatcher::state)
    /// leaves the error family.
    pub async fn errors(&self) -> ErrorStack {
        self.inner.read().await.errors.clone()
    }

    /// Last known modification time and content digest.
    pub async fn fingerprint(&self) -> Fingerprint {
        self.inner.read().await.fingerprint
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        // Releases the loop; discarding a running watcher must not leak its
        // task past one more tick.
        self.cancel.cancel();
    }
}

/// State owned by the spawned polling task.
struct WatchLoop {
    path: PathBuf,
    interval: Duration,
    fault_threshold: u32,
    inner: Arc<RwLock<Inner>>,
    state_tx: watch::Sender<State>,
    cancel: CancellationToken,
}

impl WatchLoop {
    async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval completes immediately; consume
        // it so the first observation lands one full interval after start.
        ticker.tick().await;

        let mut last_published = State::Stopped;
        // Consecutive run of the same recoverable error kind, reset by any
        // successful observation.
        let mut run_kind: Option<ErrorKind> = None;
        let mut run_len: u32 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.commit(State::Stopped, &mut last_published).await;
                    crate::debug_event!("watcher", "stopped", "{}", self.path.display());
                    break;
                }
                _ = ticker.tick() => {
                    let terminal = self
                        .tick(&mut last_published, &mut run_kind, &mut run_len)
                        .await;
                    if terminal {
                        break;
                    }
                }
            }
        }
    }

    /// One observation tick. Returns true when the loop must exit.
    async fn tick(
        &self,
        last_published: &mut State,
        run_kind: &mut Option<ErrorKind>,
        run_len: &mut u32,
    ) -> bool {
        let baseline = self.inner.read().await.fingerprint;

        match observe::check(&self.path, &baseline) {
            Observation::Failed(error) if !error.is_recoverable() => {
                let mut inner = self.inner.write().await;
                inner.errors.push(error);
                inner.state = State::Panic;
                drop(inner);

                crate::log_event!("watcher", "panic", "{}: {error}", self.path.display());
                self.publish(State::Panic, last_published);
                true
            }

            Observation::Failed(error) => {
                if *run_kind == Some(error.kind()) {
                    *run_len += 1;
                } else {
                    *run_kind = Some(error.kind());
                    *run_len = 1;
                }

                let mut inner = self.inner.write().await;
                inner.errors.push(error);

                if *run_len >= self.fault_threshold {
                    inner.state = State::Fault;
                    drop(inner);

                    crate::log_event!(
                        "watcher",
                        "fault",
                        "{}: {error} for {run_len} consecutive ticks",
                        self.path.display()
                    );
                    self.publish(State::Fault, last_published);
                    return true;
                }

                inner.state = State::Errors;
                drop(inner);

                crate::debug_event!("watcher", "error", "{}: {error}", self.path.display());
                self.publish(State::Errors, last_published);
                false
            }

            success => {
                let changed = matches!(success, Observation::Modified(_));
                *run_kind = None;
                *run_len = 0;

                let mut inner = self.inner.write().await;
                // Classification sees the stack as it stood entering this
                // tick; the successful observation then resolves it.
                let errors_pending = !inner.errors.is_empty();
                inner.errors = ErrorStack::new();

                match success {
                    Observation::Touched(mtime) => {
                        // Mtime-only churn: commit the timestamp, report no
                        // change.
                        inner.fingerprint = inner.fingerprint.with_modified(mtime);
                    }
                    Observation::Modified(fingerprint) => {
                        inner.fingerprint = fingerprint;
                    }
                    _ => {}
                }

                let state = match (changed, errors_pending) {
                    (false, false) => State::Active,
                    (false, true) => State::Errors,
                    (true, false) => State::Changed,
                    (true, true) => State::ErrorsChanged,
                };
                inner.state = state;
                let fingerprint = inner.fingerprint;
                drop(inner);

                if changed {
                    crate::log_event!(
                        "watcher",
                        "changed",
                        "{} -> {fingerprint}",
                        self.path.display()
                    );
                }
                self.publish(state, last_published);
                false
            }
        }
    }

    /// Commit a state into the shared fields and publish it.
    async fn commit(&self, state: State, last_published: &mut State) {
        self.inner.write().await.state = state;
        self.publish(state, last_published);
    }

    /// Edge-triggered publish: send only when the state differs from the
    /// last published one. The watch channel's single slot overwrites any
    /// unread value (latest wins).
    fn publish(&self, state: State, last_published: &mut State) {
        if *last_published != state {
            self.state_tx.send_replace(state);
            *last_published = state;
        }
    }
}
