//! Note domain model.
//!
//! # Invariants
//! - A persisted note has a non-empty title and description; callers check
//!   this with `Note::validate()` before writing.
//! - Ids are assigned by storage; `0` means "not yet assigned".

pub mod note;
