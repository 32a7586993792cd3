//! List synchronization use-cases.
//!
//! # Responsibility
//! - Derive list UI state from the observed note streams.
//! - Validate user input before any storage call.
//! - Run swipe-delete with undo and confirmed delete-all.
//!
//! # Invariants
//! - Displayed notes are always re-derived from the latest stream emission;
//!   local edits (swipe removal, search results) are replaced by the next one.

pub mod list_controller;
pub mod swipe_undo;
