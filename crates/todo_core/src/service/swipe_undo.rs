//! Swipe-delete undo window.
//!
//! Per swiped note: `PendingDeletion -> Restored | Finalized`. The gesture
//! and the snackbar belong to the UI; only the timing and the captured note
//! live here.

use crate::model::note::{Note, NoteId};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    /// Removed from the list and from storage; undo still possible.
    PendingDeletion,
    /// Undo ran inside the window; the note is back.
    Restored,
    /// The window closed; the deletion is permanent.
    Finalized,
}

/// A swiped note and its undo window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeDeletion {
    pub note: Note,
    /// Position the note had in the displayed list.
    pub index: usize,
    pub expires_at: Instant,
    pub state: DeletionState,
}

impl SwipeDeletion {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_settled(&self) -> bool {
        self.state != DeletionState::PendingDeletion
    }
}

/// What the UI shows after a swipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoPrompt {
    pub note_id: NoteId,
    pub message: String,
    pub expires_at: Instant,
}

/// Why a restore cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreRejection {
    /// The window closed; the entry is now finalized.
    Expired,
    /// No pending deletion for that id.
    NotPending,
}

/// Open undo windows keyed by note id.
#[derive(Debug)]
pub struct UndoTracker {
    window: Duration,
    pending: BTreeMap<NoteId, SwipeDeletion>,
}

impl UndoTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Opens an undo window for `note`, removed from `index` at `now`.
    pub fn begin(&mut self, note: Note, index: usize, now: Instant) -> UndoPrompt {
        let expires_at = now + self.window;
        let prompt = UndoPrompt {
            note_id: note.id,
            message: format!("Deleted '{}'", note.title),
            expires_at,
        };
        self.pending.insert(
            note.id,
            SwipeDeletion {
                note,
                index,
                expires_at,
                state: DeletionState::PendingDeletion,
            },
        );
        prompt
    }

    /// Returns the captured note if `id` can still be restored at `now`.
    ///
    /// An expired entry is finalized and dropped. The entry stays pending on
    /// success so a failed re-insert can be retried.
    pub fn begin_restore(&mut self, id: NoteId, now: Instant) -> Result<Note, RestoreRejection> {
        let entry = self.pending.get(&id).ok_or(RestoreRejection::NotPending)?;
        if entry.is_expired(now) {
            self.pending.remove(&id);
            return Err(RestoreRejection::Expired);
        }
        Ok(entry.note.clone())
    }

    /// Marks `id` restored and closes its window.
    pub fn complete_restore(&mut self, id: NoteId) -> Option<SwipeDeletion> {
        self.pending.remove(&id).map(|mut entry| {
            entry.state = DeletionState::Restored;
            entry
        })
    }

    /// Closes every window that has elapsed at `now`.
    pub fn finalize_expired(&mut self, now: Instant) -> Vec<SwipeDeletion> {
        let expired: Vec<NoteId> = self
            .pending
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.note.id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .map(|mut entry| {
                entry.state = DeletionState::Finalized;
                entry
            })
            .collect()
    }

    /// State of an open window, `None` once settled or never opened.
    pub fn state(&self, id: NoteId) -> Option<DeletionState> {
        self.pending.get(&id).map(|entry| entry.state)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
