//! Note entity and priority.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned note identity.
pub type NoteId = i64;

/// Id value for a note that has not been persisted yet.
pub const UNASSIGNED_NOTE_ID: NoteId = 0;

/// Importance of a note.
///
/// Declaration order is the "high first" display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Maps a picker label to a priority.
    ///
    /// Unrecognized labels fall back to `Low` instead of failing.
    pub fn from_label(label: &str) -> Self {
        match label {
            "High Priority" => Self::High,
            "Medium Priority" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Picker label, the inverse of [`Priority::from_label`].
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Priority",
            Self::Medium => "Medium Priority",
            Self::Low => "Low Priority",
        }
    }

    /// Index of this priority in the picker (`High=0`, `Medium=1`, `Low=2`).
    pub fn position(self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Inverse of [`Priority::position`]; out-of-range positions map to `Low`.
    pub fn from_position(position: usize) -> Self {
        Self::ALL.get(position).copied().unwrap_or(Self::Low)
    }

    /// Sort rank, lower is more important.
    pub fn rank(self) -> u8 {
        self.position() as u8
    }

    pub(crate) fn as_db_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub(crate) fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Direction for priority-ordered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// High, then Medium, then Low.
    HighFirst,
    /// Low, then Medium, then High.
    LowFirst,
}

/// A to-do note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `UNASSIGNED_NOTE_ID` until storage assigns one.
    pub id: NoteId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl Note {
    /// Creates a note that storage will assign an id to on insert.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self::with_id(UNASSIGNED_NOTE_ID, title, description, priority)
    }

    pub fn with_id(
        id: NoteId,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            priority,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.id != UNASSIGNED_NOTE_ID
    }

    /// Checks user-entered fields before any storage call.
    ///
    /// Text is taken as entered: whitespace-only input is not empty.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.description.is_empty() {
            return Err(NoteValidationError::EmptyDescription);
        }
        Ok(())
    }

    /// True when both notes carry the same user-visible content.
    pub fn same_content(&self, other: &Note) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.priority == other.priority
    }
}

/// Rejected user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyDescription => write!(f, "note description must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}
