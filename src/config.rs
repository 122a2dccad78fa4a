//! Configuration for assembling a ring.

use std::fmt;
use std::sync::Arc;

use crate::cluster::MembershipSource;
use crate::error::{Error, Result};
use crate::partitioning::{CrcHasher, RingHasher};
use crate::types::DEFAULT_REPLICAS;

/// Construction-time options for a [`ConsistentRing`](crate::ConsistentRing).
///
/// Defaults: [`DEFAULT_REPLICAS`] virtual nodes per server, [`CrcHasher`],
/// and no membership source.
pub struct RingConfig {
    /// Virtual nodes generated per server.
    pub replicas: usize,

    /// Key to ring position mapping.
    pub hasher: Arc<dyn RingHasher>,

    /// Optional source of join/leave events. When set, the ring starts a
    /// background consumer at construction.
    pub membership: Option<Box<dyn MembershipSource>>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            hasher: Arc::new(CrcHasher::new()),
            membership: None,
        }
    }
}

impl RingConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of virtual nodes per server.
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    /// Set the key hasher.
    pub fn with_hasher(mut self, hasher: impl RingHasher) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Set a shared key hasher.
    pub fn with_shared_hasher(mut self, hasher: Arc<dyn RingHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the membership source.
    pub fn with_membership_source(mut self, source: impl MembershipSource) -> Self {
        self.membership = Some(Box::new(source));
        self
    }

    /// Whether a membership source is configured.
    pub fn has_membership_source(&self) -> bool {
        self.membership.is_some()
    }

    /// Check that the configuration can build a ring.
    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(Error::Config("replica count must be at least 1".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for RingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingConfig")
            .field("replicas", &self.replicas)
            .field("membership", &self.membership.is_some())
            .finish_non_exhaustive()
    }
}
