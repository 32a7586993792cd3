//! Core of the to-do list app.
//!
//! Owns the note table, exposes it as observable query streams, and runs the
//! list synchronization controller the UI layer drives.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reactive;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{open_store, ConfigError, CoreConfig, DEFAULT_UNDO_WINDOW_MS};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::note::{
    Note, NoteId, NoteValidationError, Priority, PriorityOrder, UNASSIGNED_NOTE_ID,
};
pub use reactive::{NoteQuery, QuerySnapshot, SubscriptionId};
pub use repo::todo_repo::TodoRepository;
pub use service::list_controller::{
    ControllerError, ControllerResult, DeleteAllPrompt, ListController, ListView, SortMode,
    UndoOutcome,
};
pub use service::swipe_undo::{DeletionState, SwipeDeletion, UndoPrompt};
pub use store::{NoteStore, SqliteNoteStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
