//! Note storage engine.
//!
//! # Responsibility
//! - Own the canonical `notes` table and its CRUD/query operations.
//! - Re-run observed queries after every committed change.
//!
//! # Invariants
//! - Writes are serialized and atomic; reads never see a half-applied write.
//! - A mutation that changed rows publishes exactly once, before returning.
//! - Missing-id updates and deletes change nothing and publish nothing.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, PriorityOrder};
use crate::reactive::{NoteQuery, QuerySnapshot, SubscriptionId};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteNoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure.
///
/// Not-found is not an error here: see [`NoteStore::update`].
#[derive(Debug)]
pub enum StoreError {
    /// The database could not be opened or a statement failed.
    Unavailable(DbError),
    /// A persisted row does not decode into a valid [`Note`].
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "note storage unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(DbError::Sqlite(value))
    }
}

/// Note table contract.
///
/// Observers passed to `subscribe`/`subscribe_once` run while the store is
/// locked and must not call back into the store.
pub trait NoteStore: Send + Sync {
    /// Persists `note`. Id `0` gets a fresh id; any other id is kept.
    fn insert(&self, note: &Note) -> StoreResult<NoteId>;
    /// Replaces every field of the row with `note.id`.
    ///
    /// Returns `false` (and changes nothing) when no such row exists.
    fn update(&self, note: &Note) -> StoreResult<bool>;
    /// Returns `false` when no such row exists.
    fn delete_by_id(&self, id: NoteId) -> StoreResult<bool>;
    /// Clears the table and returns how many rows were removed.
    fn delete_all(&self) -> StoreResult<usize>;

    fn get(&self, id: NoteId) -> StoreResult<Option<Note>>;
    fn count(&self) -> StoreResult<usize>;
    fn list_all(&self) -> StoreResult<Vec<Note>>;
    fn list_by_priority(&self, order: PriorityOrder) -> StoreResult<Vec<Note>>;
    /// Case-insensitive substring match over titles, ascending by id.
    fn search(&self, pattern: &str) -> StoreResult<Vec<Note>>;

    /// Evaluates `query` at the current state version.
    fn fetch(&self, query: &NoteQuery) -> StoreResult<QuerySnapshot>;
    /// Delivers the current result now and again after every change.
    fn subscribe<F>(&self, query: NoteQuery, observer: F) -> StoreResult<SubscriptionId>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static;
    /// Delivers the current result once without registering.
    fn subscribe_once<F>(&self, query: NoteQuery, observer: F) -> StoreResult<()>
    where
        F: FnOnce(&QuerySnapshot);
    /// Stops deliveries to `id`. Safe to call repeatedly.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
