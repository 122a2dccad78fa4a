//! Core types used throughout the ring.

/// Opaque server identifier, typically an address or a gossip node name.
///
/// Unique within a ring's member set.
pub type ServerId = String;

/// A point in the 32-bit hash space.
pub type RingPosition = u32;

/// Number of virtual nodes generated per server when none is configured.
pub const DEFAULT_REPLICAS: usize = 20;
