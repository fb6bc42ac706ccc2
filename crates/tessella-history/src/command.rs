#![forbid(unsafe_code)]

//! Command capability consumed by the [`CommandHistory`](crate::CommandHistory).
//!
//! Every edit the map editor can perform (add a layer, paint tiles, change a
//! layer's opacity, ...) is a [`Command`]. The history only ever talks to a
//! command through this trait; it never looks at the document a command
//! mutates.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` restores prior state exactly
//! - `undo()` followed by `redo()` restores the executed state exactly
//! - `merge_with()` returning `true` means `self` now carries the combined
//!   effect of both commands, and `other` will be dropped unrecorded
//!
//! # Failure Modes
//!
//! - **Stale reference**: command refers to an entity that no longer exists
//!   - Mitigation: validate the [`EntityId`] in execute/undo and return
//!     [`CommandError::TargetNotFound`]
//! - **Invalid input**: command built from values the document rejects
//!   - Mitigation: validate in the constructor, before it reaches a history

use std::any::Any;
use std::fmt;

/// Identifier of a document entity (layer, tileset, object) a command targets.
///
/// Commands keep identifiers rather than references; the entity is looked up
/// again on every execute/undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of command execution or undo.
pub type CommandResult = Result<(), CommandError>;

/// Errors a command may report from execute/undo/redo.
///
/// The history never handles these; they are returned to whoever called
/// `push`, `undo` or `redo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Target entity no longer exists in the document.
    TargetNotFound(EntityId),
    /// Command cannot be applied to the current document state.
    InvalidState(String),
    /// Generic error with message.
    Other(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(id) => write!(f, "target entity {id} not found"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// A reversible edit that can be recorded in a command history.
pub trait Command: Send {
    /// Apply the command for the first time.
    fn execute(&mut self) -> CommandResult;

    /// Revert the command's effect.
    fn undo(&mut self) -> CommandResult;

    /// Reapply the command after it was undone.
    fn redo(&mut self) -> CommandResult {
        self.execute()
    }

    /// Human-readable label for menus ("Undo Set Opacity").
    fn label(&self) -> &str;

    /// Try to absorb an already-executed `other` into `self`.
    ///
    /// Called on the most recent history entry with the command that was
    /// just executed. Return `true` only if `self` now represents the
    /// combined effect; `other` is then dropped without being recorded.
    fn merge_with(&mut self, _other: &dyn Command) -> bool {
        false
    }

    /// Downcast hook for `merge_with` implementations.
    fn as_any(&self) -> &dyn Any;

    /// Note that the command's effect is already in the document without
    /// `execute` having run. Called when the command is stored rather than
    /// pushed.
    fn mark_applied(&mut self) {}

    /// Name used in `Debug` output and logs.
    fn debug_name(&self) -> &'static str {
        "Command"
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("label", &self.label())
            .finish()
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn execute(&mut self) -> CommandResult {
        (**self).execute()
    }

    fn undo(&mut self) -> CommandResult {
        (**self).undo()
    }

    fn redo(&mut self) -> CommandResult {
        (**self).redo()
    }

    fn label(&self) -> &str {
        (**self).label()
    }

    fn merge_with(&mut self, other: &dyn Command) -> bool {
        (**self).merge_with(other)
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn mark_applied(&mut self) {
        (**self).mark_applied();
    }

    fn debug_name(&self) -> &'static str {
        (**self).debug_name()
    }
}

/// Several commands recorded as a single history entry.
///
/// Children execute in insertion order and undo in reverse. Used for edits
/// that touch many entities at once, such as pasting a selection across
/// layers.
pub struct CompoundCommand {
    /// Commands in execution order.
    commands: Vec<Box<dyn Command>>,
    /// Label shown in the history.
    label: String,
    /// Number of leading children currently applied.
    executed_to: usize,
}

impl fmt::Debug for CompoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundCommand")
            .field("label", &self.label)
            .field("commands_count", &self.commands.len())
            .field("executed_to", &self.executed_to)
            .finish()
    }
}

impl CompoundCommand {
    /// Create an empty compound command.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            label: label.into(),
            executed_to: 0,
        }
    }

    /// Add a command that has not been applied yet.
    pub fn push(&mut self, cmd: Box<dyn Command>) {
        self.commands.push(cmd);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, cmd: impl Command + 'static) -> Self {
        self.commands.push(Box::new(cmd));
        self
    }

    /// Number of child commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if there are no child commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CompoundCommand {
    fn execute(&mut self) -> CommandResult {
        for i in 0..self.commands.len() {
            if let Err(e) = self.commands[i].execute() {
                // Roll back the children applied so far. A child that refuses
                // stays applied together with everything before it.
                self.executed_to = i;
                while self.executed_to > 0 {
                    let j = self.executed_to - 1;
                    if let Err(rollback) = self.commands[j].undo() {
                        tracing::warn!(
                            target: "tessella.history",
                            label = %self.label,
                            child = j,
                            error = %rollback,
                            "compound rollback failed"
                        );
                        break;
                    }
                    self.executed_to = j;
                }
                return Err(e);
            }
            self.executed_to = i + 1;
        }
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        while self.executed_to > 0 {
            self.commands[self.executed_to - 1].undo()?;
            self.executed_to -= 1;
        }
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn mark_applied(&mut self) {
        for cmd in &mut self.commands {
            cmd.mark_applied();
        }
        self.executed_to = self.commands.len();
    }

    fn debug_name(&self) -> &'static str {
        "CompoundCommand"
    }
}
