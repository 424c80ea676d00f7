//! Repository layer: the client store contract and its implementations.
//!
//! # Responsibility
//! - Define the query surface over stored clients.
//! - Isolate SQLite query details behind the `ClientStore` trait.
//!
//! # Invariants
//! - Every implementation returns the same results and the same error
//!   variants for the same operations.
//! - Writes run `Client::validate()` before touching storage.
//! - Stores return semantic errors (`NotFound`, `DuplicateCpf`,
//!   `IdSpaceExhausted`) in addition to DB transport errors.

pub mod client_repo;
pub mod memory_repo;
