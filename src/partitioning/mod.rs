//! Partitioning: mapping keys to servers with consistent hashing.
//!
//! ```text
//!                     0 / 2^32
//!                  ┌────●────┐
//!            srv1 ●           ● srv0          key "user:42"
//!                 │   ring    │ ◄──────────── hash ─► first position
//!            srv0 ●           ● srv2                 strictly greater,
//!                  └────●────┘                       wrapping to the start
//!                      srv1
//! ```
//!
//! - [`RingHasher`] maps keys and virtual nodes onto the ring ([`CrcHasher`] by default).
//! - [`HashRing`] is the unsynchronized ring store.
//! - [`ConsistentRing`] is the shared handle: one lock over the whole store,
//!   plus an optional membership event consumer.
//! - [`RingSnapshot`] is a detached copy of the ring grouped by server.

mod consistent;
mod hasher;
mod hashring;
mod snapshot;

pub use consistent::ConsistentRing;
pub use hasher::{CrcHasher, RingHasher};
pub use hashring::HashRing;
pub use snapshot::RingSnapshot;
