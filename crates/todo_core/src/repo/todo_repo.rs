//! To-do repository.

use crate::model::note::{Note, NoteId, PriorityOrder};
use crate::reactive::{NoteQuery, QuerySnapshot, SubscriptionId};
use crate::store::{NoteStore, StoreResult};

/// Application-facing entry point to note storage.
pub struct TodoRepository<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> TodoRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow of the underlying store, for diagnostics and tests.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current notes, ascending by id.
    pub fn fetch_all(&self) -> StoreResult<Vec<Note>> {
        self.store.list_all()
    }

    /// Observes every note, ascending by id.
    pub fn observe_all<F>(&self, observer: F) -> StoreResult<SubscriptionId>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static,
    {
        self.store.subscribe(NoteQuery::All, observer)
    }

    pub fn fetch_sorted_by(&self, order: PriorityOrder) -> StoreResult<Vec<Note>> {
        self.store.list_by_priority(order)
    }

    /// Observes every note ordered by priority.
    pub fn observe_sorted_by<F>(
        &self,
        order: PriorityOrder,
        observer: F,
    ) -> StoreResult<SubscriptionId>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static,
    {
        self.store.subscribe(NoteQuery::ByPriority(order), observer)
    }

    /// Observes an arbitrary query shape.
    pub fn observe<F>(&self, query: NoteQuery, observer: F) -> StoreResult<SubscriptionId>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static,
    {
        self.store.subscribe(query, observer)
    }

    /// One-shot title search; the result is not kept up to date.
    pub fn search(&self, pattern: &str) -> StoreResult<Vec<Note>> {
        let mut found = Vec::new();
        self.store
            .subscribe_once(NoteQuery::Search(pattern.to_string()), |snapshot| {
                found = snapshot.notes.clone();
            })?;
        Ok(found)
    }

    pub fn get(&self, id: NoteId) -> StoreResult<Option<Note>> {
        self.store.get(id)
    }

    pub fn insert(&self, note: &Note) -> StoreResult<NoteId> {
        self.store.insert(note)
    }

    /// Returns `false` when `note.id` does not exist.
    pub fn update(&self, note: &Note) -> StoreResult<bool> {
        self.store.update(note)
    }

    /// Returns `false` when `id` does not exist.
    pub fn delete_by_id(&self, id: NoteId) -> StoreResult<bool> {
        self.store.delete_by_id(id)
    }

    pub fn delete_all(&self) -> StoreResult<usize> {
        self.store.delete_all()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
