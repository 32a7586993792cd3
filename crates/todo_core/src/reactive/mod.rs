//! Observable note queries.
//!
//! # Responsibility
//! - Name the query shapes a consumer can observe.
//! - Keep per-query subscriber lists and push full result sets to them.
//!
//! # Invariants
//! - A new subscriber receives the current result before any later one.
//! - One publish delivers at most one snapshot per subscriber.
//! - A removed subscriber never receives another delivery.

pub mod hub;
pub mod query;
pub mod subscription;

pub use hub::QueryHub;
pub use query::{NoteQuery, QuerySnapshot};
pub use subscription::{Observer, SubscriptionId, Subscribers};
