//! Bounded per-channel history.

use std::collections::VecDeque;
use std::sync::Arc;

/// Lines kept per channel.
pub const BACKLOG_CAPACITY: usize = 10;

/// Most-recent-N ring of `<user> text` lines.
///
/// Owned and mutated by one dispatcher; readers only ever get a
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Clone)]
pub struct Backlog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for Backlog {
    fn default() -> Self {
        Self::new(BACKLOG_CAPACITY)
    }
}

impl Backlog {
    /// Empty backlog holding at most `capacity` lines (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, dropping the oldest line at capacity.
    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Immutable copy, oldest first.
    pub fn snapshot(&self) -> Arc<[String]> {
        self.lines.iter().cloned().collect()
    }

    /// Lines currently held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True before the first push.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
