//! Watcher lifecycle states published on the notification channel.

/// State of a file watcher, as published on its notification channel.
///
/// `Fault` and `Panic` are terminal: the loop has exited and will not
/// recover. Consumers wanting continued monitoring must construct a new
/// watcher. Use [`is_terminal`](State::is_terminal) rather than matching
/// variants to make that distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not observing: initial state, and the result of an explicit stop.
    Stopped,
    /// Healthy, no pending errors, no change this tick.
    Active,
    /// Recoverable errors pending, no new change this tick.
    Errors,
    /// Content or modification time changed this tick, no pending errors.
    Changed,
    /// Change detected while recoverable errors were pending.
    ErrorsChanged,
    /// Repeated recoverable errors crossed the fault threshold; loop halted.
    Fault,
    /// A non-recoverable error occurred; loop exited.
    Panic,
}

impl State {
    /// Whether the loop has permanently exited in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Fault | State::Panic)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Stopped => "stopped",
            State::Active => "active",
            State::Errors => "errors",
            State::Changed => "changed",
            State::ErrorsChanged => "errors+changed",
            State::Fault => "fault",
            State::Panic => "panic",
        };
        f.write_str(name)
    }
}
