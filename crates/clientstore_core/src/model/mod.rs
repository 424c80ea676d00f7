//! Domain model for the client store.
//!
//! # Responsibility
//! - Define canonical data structures used by every store implementation.
//!
//! # Invariants
//! - Every persisted client is identified by a stable `ClientId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod client;
