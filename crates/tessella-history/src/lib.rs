#![forbid(unsafe_code)]

//! Tessella command history
//!
//! Every edit in the Tessella map editor goes through a [`CommandHistory`]:
//! a bounded undo/redo stack owned by one open document.
//!
//! # Key Components
//!
//! - [`Command`] - Trait implemented by every reversible edit
//! - [`CommandHistory`] - Bounded stack with undo, redo, merging and a
//!   saved-state marker
//! - [`CompoundCommand`] - Several commands recorded as one entry
//! - [`HistoryConfig`] - Capacity settings, loadable from TOML/JSON with the
//!   `config` feature
//!
//! # Example
//!
//! ```ignore
//! let mut history = CommandHistory::default();
//! history.push(SetLayerOpacity::new(&doc, layer, 0.5))?;
//! history.push(SetLayerOpacity::new(&doc, layer, 0.7))?; // merges
//!
//! if history.can_undo() {
//!     history.undo()?;
//! }
//! let dirty = !history.is_clean();
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` events under the `tessella.history` target and
//! never installs a subscriber itself.

pub mod command;
pub mod config;
pub mod history;

pub use command::{Command, CommandError, CommandResult, CompoundCommand, EntityId};
pub use config::{HistoryConfig, HistoryConfigError};
pub use history::CommandHistory;

/// Capacity used when no preference is configured.
pub const DEFAULT_CAPACITY: usize = 64;
