//! Ordered record of observation errors.

use super::error::ErrorState;

/// Accumulates observation errors in insertion order (most recent last).
///
/// Owned exclusively by one watcher's loop; there is no internal locking.
/// Compaction happens only through [`clear`](ErrorStack::clear), which drops
/// non-recoverable entries and reports whether any were present. A fatal
/// entry normally stops the owning loop before compaction would run, so
/// after any `clear` the stack holds recoverable entries only.
#[derive(Debug, Clone, Default)]
pub struct ErrorStack {
    entries: Vec<ErrorState>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error. No deduplication.
    pub fn push(&mut self, error: ErrorState) {
        self.entries.push(error);
    }

    /// Compact the stack: retain only recoverable entries, preserving order.
    ///
    /// Returns the retained entries and whether any non-recoverable entry was
    /// dropped. Idempotent when nothing fatal was present and nothing new was
    /// pushed since the last call.
    pub fn clear(&mut self) -> (Vec<ErrorState>, bool) {
        let had_fatal = self.has_fatal();
        self.entries.retain(|e| e.is_recoverable());
        (self.entries.clone(), had_fatal)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entry is non-recoverable.
    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(|e| !e.is_recoverable())
    }

    /// Snapshot of the recorded entries, oldest first.
    pub fn entries(&self) -> &[ErrorState] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ErrorKind;

    fn stack_of(kinds: &[ErrorKind]) -> ErrorStack {
        let mut stack = ErrorStack::new();
        for &kind in kinds {
            stack.push(ErrorState::new(kind));
        }
        stack
    }

    #[test]
    fn test_clear_keeps_recoverable_in_order() {
        let mut stack = stack_of(&[
            ErrorKind::FileLost,
            ErrorKind::ProcessingFailed,
            ErrorKind::FileLost,
        ]);

        let (remaining, had_fatal) = stack.clear();

        assert!(!had_fatal);
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0].kind(), ErrorKind::FileLost);
        assert_eq!(remaining[1].kind(), ErrorKind::ProcessingFailed);
        assert_eq!(remaining[2].kind(), ErrorKind::FileLost);
    }

    #[test]
    fn test_clear_drops_fatal_and_reports_it() {
        let mut stack = stack_of(&[ErrorKind::FileLost, ErrorKind::FileNotExist]);

        let (remaining, had_fatal) = stack.clear();

        assert!(had_fatal);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind(), ErrorKind::FileLost);
        assert!(!stack.has_fatal());
    }

    #[test]
    fn test_clear_is_idempotent_without_new_pushes() {
        let mut stack = stack_of(&[ErrorKind::ProcessingFailed, ErrorKind::OpenFailed]);

        let (first, had_fatal_first) = stack.clear();
        let (second, had_fatal_second) = stack.clear();

        assert!(had_fatal_first);
        assert!(!had_fatal_second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_fatal_flags() {
        let mut stack = ErrorStack::new();
        assert!(stack.is_empty());
        assert!(!stack.has_fatal());

        stack.push(ErrorState::new(ErrorKind::FileLost));
        assert!(!stack.is_empty());
        assert!(!stack.has_fatal());

        stack.push(ErrorState::new(ErrorKind::OpenFailed));
        assert!(stack.has_fatal());
        assert_eq!(stack.len(), 2);
    }
}
