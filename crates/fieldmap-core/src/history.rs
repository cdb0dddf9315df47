//! Bounded undo/redo log.

/// Default maximum number of snapshots kept.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// A bounded, linear log of snapshots with a cursor.
///
/// The entry under the cursor is the current state. `undo` and `redo` move the
/// cursor and hand back the snapshot to apply; the log never touches the data
/// it records.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    index: usize,
    max_depth: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl<T> History<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Start a log whose current state is `initial`.
    pub fn with_initial(initial: T, max_depth: usize) -> Self {
        let mut history = Self::new(max_depth);
        history.push(initial);
        history
    }

    /// Record a new state, discarding any redo branch.
    pub fn push(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.push(initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_undo_returns_previous() {
        let mut history = History::new(10);
        history.push("s1");
        history.push("s2");
        assert_eq!(history.undo(), Some(&"s1"));
        assert_eq!(history.redo(), Some(&"s2"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = History::new(10);
        history.push("s1");
        history.push("s2");
        history.undo();
        history.push("s3");
        assert_eq!(history.redo(), None);
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo(), Some(&"s1"));
    }

    #[test]
    fn test_undo_at_oldest_is_noop() {
        let mut history = History::new(10);
        assert_eq!(history.undo(), None);
        history.push(1);
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some(&1));
    }

    #[test]
    fn test_depth_bound_evicts_oldest() {
        let max = DEFAULT_MAX_HISTORY;
        let mut history = History::default();
        for i in 0..max + 5 {
            history.push(i);
        }
        assert_eq!(history.len(), max);
        assert_eq!(history.current_index(), max - 1);
        assert_eq!(history.current(), Some(&(max + 4)));
        // The oldest five were evicted.
        let mut oldest = history.current().copied();
        while let Some(v) = history.undo() {
            oldest = Some(*v);
        }
        assert_eq!(oldest, Some(5));
    }

    #[test]
    fn test_reset() {
        let mut history = History::with_initial(0, 5);
        history.push(1);
        history.reset(7);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&7));
        assert!(!history.can_redo());
    }

    proptest! {
        #[test]
        fn prop_cursor_flags_match_index(ops in proptest::collection::vec(0u8..3, 0..200)) {
            let mut history = History::new(8);
            let mut next = 0u32;
            for op in ops {
                match op {
                    0 => { history.push(next); next += 1; }
                    1 => { history.undo(); }
                    _ => { history.redo(); }
                }
                prop_assert!(history.len() <= 8);
                prop_assert_eq!(history.can_undo(), history.current_index() > 0);
                prop_assert_eq!(
                    history.can_redo(),
                    !history.is_empty() && history.current_index() < history.len() - 1
                );
            }
        }
    }
}
