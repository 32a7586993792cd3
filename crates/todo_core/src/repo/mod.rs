//! Repository façade over the note store.
//!
//! # Invariants
//! - No business rules live here; every call maps onto one store call.
//! - The store is injected, never looked up globally.

pub mod todo_repo;
