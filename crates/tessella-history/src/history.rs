#![forbid(unsafe_code)]

//! Bounded command history with undo/redo, merging and a clean marker.
//!
//! [`CommandHistory`] keeps every recorded command in a single deque, oldest
//! at the front, and tracks two optional positions into it:
//!
//! - **current**: the most recently applied command (`None` when nothing is
//!   applied)
//! - **clean**: the position the document was last saved at
//!
//! # Invariants
//!
//! 1. `entries.len() <= capacity` (after any operation)
//! 2. `current_index`, if set, is `< entries.len()`
//! 3. `clean_index`, if set, is `< entries.len()`
//! 4. Entries after `current_index` are the redo tail and are not applied
//! 5. `is_clean()` iff `entries` is empty or `clean_index == current_index`
//!
//! # Push ordering
//!
//! ```text
//! capacity = 3, entries = [A, B, C], current = 1 (C undone)
//!
//! push(D)
//!   1. full: evict A        [B, C]     current = 0
//!   2. truncate tail        [B]        current = 0
//!   3. D.execute()
//!   4. B.merge_with(D)?     no
//!   5. append               [B, D]     current = 1
//! ```
//!
//! Bookkeeping happens before execution, so a command whose `execute` fails
//! is never half-recorded.

use std::collections::VecDeque;
use std::fmt;

use crate::DEFAULT_CAPACITY;
use crate::command::{Command, CommandResult};
use crate::config::HistoryConfig;

/// Undo/redo stack owned by a single document.
pub struct CommandHistory {
    /// Recorded commands, oldest at front.
    entries: VecDeque<Box<dyn Command>>,
    /// Index of the most recently applied command.
    current_index: Option<usize>,
    /// Index of the entry the document was last saved at.
    clean_index: Option<usize>,
    /// Maximum number of entries retained.
    capacity: usize,
}

impl fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("current_index", &self.current_index)
            .field("clean_index", &self.clean_index)
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CommandHistory {
    /// Create an empty history retaining at most `capacity` commands.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "command history capacity must be positive");
        Self {
            entries: VecDeque::new(),
            current_index: None,
            clean_index: None,
            capacity,
        }
    }

    /// Create an empty history from a loaded configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is zero. Loaded files are not checked;
    /// call [`HistoryConfig::validate`] first.
    #[must_use]
    pub fn with_config(config: &HistoryConfig) -> Self {
        Self::new(config.capacity)
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Execute `cmd` and record it, merging into the last entry if it
    /// accepts.
    ///
    /// The command lives on the stack until it is known to be appended, so
    /// commands that merge (slider drags, bucket fills during one stroke)
    /// are never boxed.
    ///
    /// # Errors
    ///
    /// Returns the command's own error if `execute` fails. The history is
    /// left evicted/truncated but without a new entry.
    pub fn push<C: Command + 'static>(&mut self, mut cmd: C) -> CommandResult {
        self.prepare_for_append();
        Self::execute_new(&mut cmd)?;
        if self.try_merge(&cmd) {
            return Ok(());
        }
        self.append(Box::new(cmd));
        Ok(())
    }

    /// [`push`](Self::push) for an already boxed command.
    ///
    /// # Errors
    ///
    /// Returns the command's own error if `execute` fails.
    pub fn push_boxed(&mut self, mut cmd: Box<dyn Command>) -> CommandResult {
        self.prepare_for_append();
        Self::execute_new(&mut *cmd)?;
        if self.try_merge(&*cmd) {
            return Ok(());
        }
        self.append(cmd);
        Ok(())
    }

    /// Record a command whose effect the caller already applied.
    ///
    /// Used when an interactive tool edits the document directly and only
    /// registers the finished edit. No execution and no merge attempt; the
    /// command is told through [`Command::mark_applied`].
    pub fn store<C: Command + 'static>(&mut self, cmd: C) {
        self.store_boxed(Box::new(cmd));
    }

    /// [`store`](Self::store) for an already boxed command.
    pub fn store_boxed(&mut self, mut cmd: Box<dyn Command>) {
        cmd.mark_applied();
        self.prepare_for_append();
        self.append(cmd);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Undo the current command.
    ///
    /// # Errors
    ///
    /// Returns the command's error if its `undo` fails; indices are left
    /// unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if [`can_undo`](Self::can_undo) is false.
    pub fn undo(&mut self) -> CommandResult {
        let index = match self.current_index {
            Some(index) if index < self.entries.len() => index,
            _ => panic!("undo() called with nothing to undo"),
        };

        let cmd = &mut self.entries[index];
        if let Err(e) = cmd.undo() {
            tracing::warn!(
                target: "tessella.history",
                label = %cmd.label(),
                index,
                error = %e,
                "undo failed"
            );
            return Err(e);
        }

        self.current_index = index.checked_sub(1);
        tracing::debug!(
            target: "tessella.history",
            label = %self.entries[index].label(),
            current_index = ?self.current_index,
            "undo"
        );
        Ok(())
    }

    /// Redo the next command in the redo tail.
    ///
    /// # Errors
    ///
    /// Returns the command's error if its `redo` fails; indices are left
    /// unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if [`can_redo`](Self::can_redo) is false.
    pub fn redo(&mut self) -> CommandResult {
        assert!(self.can_redo(), "redo() called with nothing to redo");
        let index = self.next_index();

        let cmd = &mut self.entries[index];
        if let Err(e) = cmd.redo() {
            tracing::warn!(
                target: "tessella.history",
                label = %cmd.label(),
                index,
                error = %e,
                "redo failed"
            );
            return Err(e);
        }

        self.current_index = Some(index);
        tracing::debug!(
            target: "tessella.history",
            label = %self.entries[index].label(),
            current_index = index,
            "redo"
        );
        Ok(())
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.current_index.is_some() && !self.entries.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.current_index {
            None => !self.entries.is_empty(),
            Some(index) => index + 1 < self.entries.len(),
        }
    }

    /// Label of the command [`undo`](Self::undo) would revert.
    ///
    /// # Panics
    ///
    /// Panics if [`can_undo`](Self::can_undo) is false.
    #[must_use]
    pub fn undo_label(&self) -> &str {
        assert!(self.can_undo(), "undo_label() called with nothing to undo");
        let index = self.current_index.unwrap_or_default();
        self.entries[index].label()
    }

    /// Label of the command [`redo`](Self::redo) would reapply.
    ///
    /// # Panics
    ///
    /// Panics if [`can_redo`](Self::can_redo) is false.
    #[must_use]
    pub fn redo_label(&self) -> &str {
        assert!(self.can_redo(), "redo_label() called with nothing to redo");
        self.entries[self.next_index()].label()
    }

    // ========================================================================
    // Clean state
    // ========================================================================

    /// Remember the current position as the saved state.
    pub fn mark_clean(&mut self) {
        self.clean_index = self.current_index;
        tracing::debug!(
            target: "tessella.history",
            clean_index = ?self.clean_index,
            "mark clean"
        );
    }

    /// Forget the saved position; the document counts as modified until the
    /// next [`mark_clean`](Self::mark_clean).
    pub fn reset_clean(&mut self) {
        self.clean_index = None;
        tracing::debug!(target: "tessella.history", "reset clean");
    }

    /// Check if the document matches its last saved state.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty() || self.clean_index == self.current_index
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    /// Change the capacity, evicting the oldest entries if over the limit.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn set_capacity(&mut self, capacity: usize) {
        assert!(capacity > 0, "command history capacity must be positive");
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.evict_oldest();
        }
        tracing::debug!(
            target: "tessella.history",
            capacity,
            len = self.entries.len(),
            current_index = ?self.current_index,
            clean_index = ?self.clean_index,
            "set capacity"
        );
    }

    /// Apply a (re)loaded configuration to a live history.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is zero.
    pub fn apply_config(&mut self, config: &HistoryConfig) {
        if config.capacity != self.capacity {
            self.set_capacity(config.capacity);
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Maximum number of retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded entries, including the redo tail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no commands are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the most recently applied command.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Index of the saved state, if still reachable.
    #[must_use]
    pub fn clean_index(&self) -> Option<usize> {
        self.clean_index
    }

    /// Labels of applied commands, most recent first.
    pub fn undo_labels(&self, limit: usize) -> Vec<&str> {
        let applied = self.current_index.map_or(0, |index| index + 1);
        self.entries
            .iter()
            .take(applied)
            .rev()
            .take(limit)
            .map(|c| c.label())
            .collect()
    }

    /// Labels of the redo tail, next redo first.
    pub fn redo_labels(&self, limit: usize) -> Vec<&str> {
        self.entries
            .iter()
            .skip(self.next_index())
            .take(limit)
            .map(|c| c.label())
            .collect()
    }

    /// Iterate over all entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &dyn Command)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, cmd)| (index, &**cmd))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Drop every entry without undoing anything.
    ///
    /// Used when the document is reloaded and no recorded edit applies to it
    /// anymore.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.current_index = None;
        self.clean_index = None;
        tracing::debug!(target: "tessella.history", dropped, "clear");
    }

    /// Index the next `redo` would apply.
    fn next_index(&self) -> usize {
        self.current_index.map_or(0, |index| index + 1)
    }

    /// Steps 1 and 2 of recording: make room, then drop the redo tail.
    fn prepare_for_append(&mut self) {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.truncate_redo_tail();
    }

    /// Remove the entry at index 0 and shift both indices down by one.
    fn evict_oldest(&mut self) {
        let Some(evicted) = self.entries.pop_front() else {
            return;
        };
        self.current_index = self.current_index.and_then(|index| index.checked_sub(1));
        self.clean_index = self.clean_index.and_then(|index| index.checked_sub(1));
        tracing::debug!(
            target: "tessella.history",
            label = %evicted.label(),
            current_index = ?self.current_index,
            clean_index = ?self.clean_index,
            "evicted oldest command"
        );
    }

    /// Drop every entry after `current_index`.
    fn truncate_redo_tail(&mut self) {
        let start = self.next_index();
        if start >= self.entries.len() {
            return;
        }

        let discarded = self.entries.len() - start;
        self.entries.truncate(start);
        if self.clean_index.is_some_and(|clean| clean >= start) {
            self.clean_index = None;
        }
        tracing::debug!(
            target: "tessella.history",
            discarded,
            clean_index = ?self.clean_index,
            "truncated redo tail"
        );
    }

    /// Step 3: execute a command that is about to be recorded.
    fn execute_new(cmd: &mut dyn Command) -> CommandResult {
        cmd.execute().inspect_err(|e| {
            tracing::warn!(
                target: "tessella.history",
                label = %cmd.label(),
                error = %e,
                "command failed to execute; not recorded"
            );
        })
    }

    /// Step 4: offer an executed command to the last entry.
    fn try_merge(&mut self, cmd: &dyn Command) -> bool {
        let Some(last) = self.entries.back_mut() else {
            return false;
        };
        if !last.merge_with(cmd) {
            return false;
        }

        self.clean_index = None;
        tracing::debug!(
            target: "tessella.history",
            into = %last.label(),
            merged = %cmd.label(),
            current_index = ?self.current_index,
            "merged command"
        );
        true
    }

    /// Step 5: append and make the new entry current.
    fn append(&mut self, cmd: Box<dyn Command>) {
        self.entries.push_back(cmd);
        let index = self.entries.len() - 1;
        self.current_index = Some(index);
        tracing::debug!(
            target: "tessella.history",
            label = %self.entries[index].label(),
            current_index = index,
            clean_index = ?self.clean_index,
            len = self.entries.len(),
            "recorded command"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
