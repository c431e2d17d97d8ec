//! Cursor-based playback over a compiled command list.
//!
//! Commands are already sorted by start time. A cursor tracks the current
//! read position so that `drain_range` only scans unconsumed commands, and
//! `seek` supports scrubbing to an arbitrary time.

use super::types::Command;

/// A read cursor over time-sorted commands.
pub struct Timeline<'a> {
    commands: &'a [Command],
    cursor: usize,
}

impl<'a> Timeline<'a> {
    /// Wrap commands sorted by `time_offset`, as found in a
    /// [`CommandSequence`](super::CommandSequence).
    pub fn new(commands: &'a [Command]) -> Self {
        Self {
            commands,
            cursor: 0,
        }
    }

    /// Drain all commands starting in `[from, to)` and advance the cursor past them.
    ///
    /// Commands before `from` that have not been consumed are skipped.
    pub fn drain_range(&mut self, from: f64, to: f64) -> Vec<&'a Command> {
        let mut result = Vec::new();
        while let Some(cmd) = self.commands.get(self.cursor) {
            if cmd.time_offset >= to {
                break;
            }
            if cmd.time_offset >= from {
                result.push(cmd);
            }
            self.cursor += 1;
        }
        result
    }

    /// Move the cursor to the first command starting at or after `t`.
    pub fn seek(&mut self, t: f64) {
        self.cursor = self.commands.partition_point(|c| c.time_offset < t);
    }

    /// Peek at the next unconsumed command without advancing the cursor.
    pub fn peek_next(&self) -> Option<&'a Command> {
        self.commands.get(self.cursor)
    }

    /// Reset the cursor to the beginning.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Total number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of unconsumed commands remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.commands.len().saturating_sub(self.cursor)
    }
}
