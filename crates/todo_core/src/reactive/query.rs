//! Query shapes and the snapshots delivered for them.

use crate::model::note::{Note, PriorityOrder};
use serde::{Deserialize, Serialize};

/// One observable view of the note table.
///
/// Every distinct value is its own stream: two subscribers to
/// `Search("rent")` share results, a subscriber to `All` does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteQuery {
    /// Every note, ascending by id.
    All,
    /// Every note ordered by priority, ties ascending by id.
    ByPriority(PriorityOrder),
    /// Notes whose title contains the raw substring, ignoring case.
    Search(String),
}

impl NoteQuery {
    /// Short stable name for log lines; never includes the search text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ByPriority(PriorityOrder::HighFirst) => "priority_high_first",
            Self::ByPriority(PriorityOrder::LowFirst) => "priority_low_first",
            Self::Search(_) => "search",
        }
    }
}

/// Full result of a query at one state version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub query: NoteQuery,
    /// Number of committed mutations that changed the table so far.
    pub version: u64,
    pub notes: Vec<Note>,
}

impl QuerySnapshot {
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
