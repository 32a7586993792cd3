//! List synchronization controller.
//!
//! # Responsibility
//! - Keep the displayed note list and empty-state flag in step with storage.
//! - Switch between id order and the two priority orders.
//! - Validate and submit new and edited notes.
//! - Run swipe-delete with a timed undo, and confirmed delete-all.
//!
//! # Invariants
//! - Exactly one sort-mode stream is observed while active.
//! - Invalid input never reaches the repository.
//! - View listeners run under the controller's state lock and must not call
//!   back into the controller.

use crate::config::CoreConfig;
use crate::model::note::{Note, NoteId, NoteValidationError, Priority, PriorityOrder};
use crate::reactive::{NoteQuery, QuerySnapshot, SubscriptionId, Subscribers};
use crate::repo::todo_repo::TodoRepository;
use crate::service::swipe_undo::{RestoreRejection, SwipeDeletion, UndoPrompt, UndoTracker};
use crate::store::{NoteStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Failure of a list intent.
#[derive(Debug)]
pub enum ControllerError {
    /// Empty title or description; nothing was written.
    Validation(NoteValidationError),
    /// Storage failed; the note table is unchanged.
    Store(StoreError),
    /// Swipe targeted a position outside the displayed list.
    IndexOutOfRange { index: usize, len: usize },
    /// `confirm_delete_all` without a preceding `request_delete_all`.
    NoPendingConfirmation,
    /// The intent needs the list streams and the controller is inactive.
    Inactive,
    /// The swiped note was already gone from storage; no undo window opened.
    NoteMissing(NoteId),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "list index {index} out of range for {len} notes")
            }
            Self::NoPendingConfirmation => write!(f, "delete-all was not requested"),
            Self::Inactive => write!(f, "list controller is not active"),
            Self::NoteMissing(id) => write!(f, "note {id} no longer exists"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::IndexOutOfRange { .. }
            | Self::NoPendingConfirmation
            | Self::Inactive
            | Self::NoteMissing(_) => None,
        }
    }
}

impl From<NoteValidationError> for ControllerError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Order of the displayed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// Insertion (id) order.
    #[default]
    ById,
    PriorityHighFirst,
    PriorityLowFirst,
}

impl SortMode {
    pub fn query(self) -> NoteQuery {
        match self {
            Self::ById => NoteQuery::All,
            Self::PriorityHighFirst => NoteQuery::ByPriority(PriorityOrder::HighFirst),
            Self::PriorityLowFirst => NoteQuery::ByPriority(PriorityOrder::LowFirst),
        }
    }
}

/// Delete-all confirmation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteAllPrompt {
    #[default]
    Idle,
    Requested,
}

/// Result of an undo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The note is back under its previous id.
    Restored(SwipeDeletion),
    /// The window had closed; the note stays deleted.
    Expired,
    /// Nothing to undo for that id.
    NotPending,
}

/// What the list screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub notes: Vec<Note>,
    /// Whether the note table is empty (not just the displayed list).
    pub is_empty: bool,
    pub sort_mode: SortMode,
    /// Set while the list shows one-shot search results.
    pub search: Option<String>,
    /// State version of the latest emission applied.
    pub version: u64,
}

#[derive(Default)]
struct ListShared {
    view: ListView,
    /// Latest emission of the sort-mode stream, kept to end a search.
    mode_notes: Vec<Note>,
    listeners: Subscribers<(), ListView>,
}

impl ListShared {
    fn apply_all_snapshot(&mut self, snapshot: &QuerySnapshot) {
        self.view.is_empty = snapshot.is_empty();
    }

    fn apply_mode_snapshot(&mut self, mode: SortMode, snapshot: &QuerySnapshot) {
        // A stream being replaced may still deliver once before it is dropped.
        if mode != self.view.sort_mode {
            return;
        }
        self.mode_notes = snapshot.notes.clone();
        self.view.notes = snapshot.notes.clone();
        self.view.search = None;
        self.view.version = snapshot.version;
        self.publish();
    }

    fn publish(&mut self) {
        let Self {
            view, listeners, ..
        } = self;
        listeners.notify_all(view);
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ActiveStreams {
    all: Option<SubscriptionId>,
    mode: Option<SubscriptionId>,
}

/// Mediates between list intents and the repository.
pub struct ListController<S: NoteStore + 'static> {
    repo: Arc<TodoRepository<S>>,
    shared: Arc<Mutex<ListShared>>,
    streams: ActiveStreams,
    undo: UndoTracker,
    delete_all_prompt: DeleteAllPrompt,
}

impl<S: NoteStore + 'static> ListController<S> {
    pub fn new(repo: Arc<TodoRepository<S>>, config: &CoreConfig) -> Self {
        Self {
            repo,
            shared: Arc::new(Mutex::new(ListShared::default())),
            streams: ActiveStreams::default(),
            undo: UndoTracker::new(config.undo_window()),
            delete_all_prompt: DeleteAllPrompt::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.streams.all.is_some()
    }

    /// Starts observing the note table. Calling it again is a no-op.
    pub fn activate(&mut self) -> ControllerResult<()> {
        if self.is_active() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let all = self.repo.observe_all(move |snapshot| {
            lock_shared(&shared).apply_all_snapshot(snapshot);
        })?;
        self.streams.all = Some(all);

        let mode = self.sort_mode();
        match self.observe_mode(mode) {
            Ok(id) => self.streams.mode = Some(id),
            Err(err) => {
                self.repo.unsubscribe(all);
                self.streams.all = None;
                return Err(err);
            }
        }

        info!(
            "event=list_activate module=service status=ok sort_mode={:?}",
            mode
        );
        Ok(())
    }

    /// Stops observing and drops the displayed list. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        let was_active = self.is_active();
        if let Some(id) = self.streams.mode.take() {
            self.repo.unsubscribe(id);
        }
        if let Some(id) = self.streams.all.take() {
            self.repo.unsubscribe(id);
        }
        if !was_active {
            return;
        }

        // The list no longer follows the table; keep only the chosen order.
        let mut shared = lock_shared(&self.shared);
        let sort_mode = shared.view.sort_mode;
        shared.view = ListView {
            sort_mode,
            ..ListView::default()
        };
        shared.mode_notes.clear();
        shared.publish();
    }

    /// Latest derived list state.
    pub fn view(&self) -> ListView {
        lock_shared(&self.shared).view.clone()
    }

    pub fn sort_mode(&self) -> SortMode {
        lock_shared(&self.shared).view.sort_mode
    }

    /// Pushes the current view now and after every change.
    pub fn subscribe_view<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ListView) + Send + 'static,
    {
        let mut shared = lock_shared(&self.shared);
        let id = shared.listeners.subscribe((), Box::new(listener));
        let ListShared {
            view, listeners, ..
        } = &mut *shared;
        listeners.notify(id, view);
        id
    }

    pub fn unsubscribe_view(&self, id: SubscriptionId) -> bool {
        lock_shared(&self.shared).listeners.unsubscribe(id)
    }

    /// Switches the displayed order.
    ///
    /// The new mode's stream is observed before the previous one is dropped.
    pub fn set_sort_mode(&mut self, mode: SortMode) -> ControllerResult<()> {
        let previous_mode = self.sort_mode();
        if previous_mode == mode {
            return Ok(());
        }

        lock_shared(&self.shared).view.sort_mode = mode;
        if !self.is_active() {
            return Ok(());
        }

        let next = match self.observe_mode(mode) {
            Ok(id) => id,
            Err(err) => {
                lock_shared(&self.shared).view.sort_mode = previous_mode;
                return Err(err);
            }
        };
        if let Some(previous) = self.streams.mode.replace(next) {
            self.repo.unsubscribe(previous);
        }

        info!(
            "event=sort_mode_change module=service status=ok from={:?} to={:?}",
            previous_mode, mode
        );
        Ok(())
    }

    /// Validates and inserts a note from the add screen.
    pub fn submit_new(
        &self,
        title: &str,
        description: &str,
        priority_label: &str,
    ) -> ControllerResult<NoteId> {
        let note = Note::new(title, description, Priority::from_label(priority_label));
        note.validate()?;
        Ok(self.repo.insert(&note)?)
    }

    /// Validates and applies an edit. Returns `false` if `id` no longer exists.
    pub fn submit_edit(
        &self,
        id: NoteId,
        title: &str,
        description: &str,
        priority_label: &str,
    ) -> ControllerResult<bool> {
        let note = Note::with_id(id, title, description, Priority::from_label(priority_label));
        note.validate()?;
        Ok(self.repo.update(&note)?)
    }

    /// Shows notes whose title contains `pattern` until the next change or
    /// [`ListController::clear_search`].
    pub fn search(&self, pattern: &str) -> ControllerResult<Vec<Note>> {
        let found = self.repo.search(pattern)?;
        let mut shared = lock_shared(&self.shared);
        shared.view.notes = found.clone();
        shared.view.search = Some(pattern.to_string());
        shared.publish();
        Ok(found)
    }

    /// Returns to the sort-mode list after a search.
    pub fn clear_search(&self) {
        let mut shared = lock_shared(&self.shared);
        if shared.view.search.take().is_none() {
            return;
        }
        shared.view.notes = shared.mode_notes.clone();
        shared.publish();
    }

    /// Removes the note displayed at `index` and opens its undo window.
    pub fn swipe_delete(&mut self, index: usize) -> ControllerResult<UndoPrompt> {
        self.swipe_delete_at(index, Instant::now())
    }

    pub fn swipe_delete_at(&mut self, index: usize, now: Instant) -> ControllerResult<UndoPrompt> {
        self.undo.finalize_expired(now);
        if !self.is_active() {
            return Err(ControllerError::Inactive);
        }

        let note = {
            let mut shared = lock_shared(&self.shared);
            let len = shared.view.notes.len();
            if index >= len {
                return Err(ControllerError::IndexOutOfRange { index, len });
            }
            let note = shared.view.notes.remove(index);
            shared.publish();
            note
        };

        match self.repo.delete_by_id(note.id) {
            Ok(true) => {}
            Ok(false) => {
                // Another writer removed it first; its emission already
                // refreshed the list, so there is nothing to undo.
                warn!(
                    "event=swipe_delete module=service status=missing note_id={}",
                    note.id
                );
                return Err(ControllerError::NoteMissing(note.id));
            }
            Err(err) => {
                warn!(
                    "event=swipe_delete module=service status=error note_id={} error={}",
                    note.id, err
                );
                let mut shared = lock_shared(&self.shared);
                let at = index.min(shared.view.notes.len());
                shared.view.notes.insert(at, note);
                shared.publish();
                return Err(err.into());
            }
        }

        info!(
            "event=swipe_delete module=service status=ok note_id={} index={}",
            note.id, index
        );
        Ok(self.undo.begin(note, index, now))
    }

    /// Restores a swiped note if its window is still open.
    pub fn undo(&mut self, id: NoteId) -> ControllerResult<UndoOutcome> {
        self.undo_at(id, Instant::now())
    }

    pub fn undo_at(&mut self, id: NoteId, now: Instant) -> ControllerResult<UndoOutcome> {
        let expired = self.undo.finalize_expired(now);
        if expired.iter().any(|entry| entry.note.id == id) {
            info!(
                "event=undo module=service status=expired note_id={}",
                id
            );
            return Ok(UndoOutcome::Expired);
        }

        let note = match self.undo.begin_restore(id, now) {
            Ok(note) => note,
            Err(RestoreRejection::Expired) => {
                info!(
                    "event=undo module=service status=expired note_id={}",
                    id
                );
                return Ok(UndoOutcome::Expired);
            }
            Err(RestoreRejection::NotPending) => return Ok(UndoOutcome::NotPending),
        };

        // Re-insert under the old id so the note keeps its identity and place.
        self.repo.insert(&note)?;
        info!("event=undo module=service status=ok note_id={}", id);
        Ok(match self.undo.complete_restore(id) {
            Some(restored) => UndoOutcome::Restored(restored),
            None => UndoOutcome::NotPending,
        })
    }

    /// Closes every undo window that has elapsed.
    pub fn finalize_expired(&mut self) -> Vec<SwipeDeletion> {
        self.finalize_expired_at(Instant::now())
    }

    pub fn finalize_expired_at(&mut self, now: Instant) -> Vec<SwipeDeletion> {
        self.undo.finalize_expired(now)
    }

    pub fn pending_undo_count(&self) -> usize {
        self.undo.pending_count()
    }

    /// First step of delete-all: the UI now asks for confirmation.
    pub fn request_delete_all(&mut self) -> DeleteAllPrompt {
        self.delete_all_prompt = DeleteAllPrompt::Requested;
        self.delete_all_prompt
    }

    /// Clears the table if delete-all was requested. Returns removed rows.
    pub fn confirm_delete_all(&mut self) -> ControllerResult<usize> {
        if self.delete_all_prompt != DeleteAllPrompt::Requested {
            return Err(ControllerError::NoPendingConfirmation);
        }
        self.delete_all_prompt = DeleteAllPrompt::Idle;
        let removed = self.repo.delete_all()?;
        info!(
            "event=delete_all_confirm module=service status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    /// Dismisses the confirmation without touching any note.
    pub fn decline_delete_all(&mut self) {
        self.delete_all_prompt = DeleteAllPrompt::Idle;
    }

    pub fn delete_all_prompt(&self) -> DeleteAllPrompt {
        self.delete_all_prompt
    }

    fn observe_mode(&self, mode: SortMode) -> ControllerResult<SubscriptionId> {
        let shared = Arc::clone(&self.shared);
        let id = self.repo.observe(mode.query(), move |snapshot| {
            lock_shared(&shared).apply_mode_snapshot(mode, snapshot);
        })?;
        Ok(id)
    }
}

impl<S: NoteStore + 'static> Drop for ListController<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn lock_shared(shared: &Mutex<ListShared>) -> MutexGuard<'_, ListShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
