//! Datawheel Store - persisted group membership
//!
//! Group membership survives between runs as a small JSON document
//! mapping each group label to its ordered member list.

pub mod groups;

// Re-exports
pub use groups::{GroupStore, StoreError, StoreResult};
