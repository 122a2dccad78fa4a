//! Consistent hashing ring with virtual nodes.
//!
//! Each server is placed on a 32-bit ring at `replicas` positions, computed as
//! `hash(server ++ i)` for `i` in `0..replicas`. A key is owned by the server
//! whose position is the first one strictly greater than the key's hash,
//! wrapping around to the smallest position when no such position exists.
//!
//! [`HashRing`] is not synchronized; see
//! [`ConsistentRing`](crate::partitioning::ConsistentRing) for the shared,
//! lock-guarded handle.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::partitioning::hasher::{CrcHasher, RingHasher};
use crate::partitioning::snapshot::RingSnapshot;
use crate::types::{RingPosition, ServerId, DEFAULT_REPLICAS};

/// The sorted position buffer is reallocated on removal once its capacity
/// exceeds this many times the positions the current members need.
const SHRINK_FACTOR: usize = 4;

/// A consistent hash ring mapping keys to servers.
///
/// Invariants, holding after every public call:
/// - `positions` is sorted ascending and holds exactly the keys of `ring`.
/// - every value in `ring` is a member.
/// - absent collisions, each member owns exactly `replicas` positions.
#[derive(Clone)]
pub struct HashRing {
    /// Current servers.
    members: HashSet<ServerId>,

    /// Virtual-node position to owning server.
    ring: HashMap<RingPosition, ServerId>,

    /// Sorted mirror of `ring`'s keys, binary searched on lookup.
    positions: Vec<RingPosition>,

    /// Key to position mapping.
    hasher: Arc<dyn RingHasher>,

    /// Virtual nodes per server.
    replicas: usize,
}

impl HashRing {
    /// Create an empty ring.
    ///
    /// A replica count of zero is raised to one.
    pub fn new(replicas: usize, hasher: Arc<dyn RingHasher>) -> Self {
        Self {
            members: HashSet::new(),
            ring: HashMap::new(),
            positions: Vec::new(),
            hasher,
            replicas: replicas.max(1),
        }
    }

    /// Number of virtual nodes generated per server.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Number of servers in the ring.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ring has no servers.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a server is in the ring.
    pub fn contains(&self, server: &str) -> bool {
        self.members.contains(server)
    }

    /// All servers in the ring, sorted.
    pub fn members(&self) -> Vec<ServerId> {
        let mut members: Vec<ServerId> = self.members.iter().cloned().collect();
        members.sort();
        members
    }

    /// Number of occupied ring positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Occupied ring positions in ascending order.
    pub fn positions(&self) -> &[RingPosition] {
        &self.positions
    }

    /// The server owning an exact ring position, if any.
    pub fn owner_at(&self, position: RingPosition) -> Option<&str> {
        self.ring.get(&position).map(String::as_str)
    }

    /// Add a server and its virtual nodes.
    ///
    /// Fails with [`Error::AlreadyExists`] without touching the ring if the
    /// server is already a member. A virtual node landing on an occupied
    /// position takes it over; the collision is logged.
    ///
    /// Returns the number of positions the server actually gained, which is
    /// `replicas` minus the number of collisions.
    pub fn add(&mut self, server: &str) -> Result<usize> {
        if self.members.contains(server) {
            return Err(Error::AlreadyExists(server.to_string()));
        }

        let before = self.positions.len();
        self.positions.reserve(self.replicas);

        for i in 0..self.replicas {
            let position = self.hasher.hash(&vnode_key(server, i));
            match self.ring.insert(position, server.to_string()) {
                None => self.positions.push(position),
                Some(previous) => {
                    warn!(
                        server,
                        replica = i,
                        position,
                        previous = %previous,
                        "virtual node collision, position reassigned"
                    );
                }
            }
        }

        self.members.insert(server.to_string());
        self.positions.sort_unstable();

        let gained = self.positions.len() - before;
        debug!(server, replicas = self.replicas, gained, "added server to ring");
        Ok(gained)
    }

    /// Remove a server and its virtual nodes.
    ///
    /// Fails with [`Error::NotFound`] without touching the ring if the server
    /// is not a member. Positions the server lost to a later collision stay
    /// with their current owner.
    pub fn remove(&mut self, server: &str) -> Result<()> {
        if !self.members.remove(server) {
            return Err(Error::NotFound(server.to_string()));
        }

        for i in 0..self.replicas {
            let position = self.hasher.hash(&vnode_key(server, i));
            if self.ring.get(&position).is_some_and(|owner| owner == server) {
                self.ring.remove(&position);
            }
        }

        self.rebuild_positions();
        debug!(server, remaining = self.members.len(), "removed server from ring");
        Ok(())
    }

    /// Find the server owning `key`.
    ///
    /// Fails with [`Error::EmptyRing`] if there is no server to return.
    pub fn get(&self, key: &str) -> Result<&str> {
        if self.members.is_empty() {
            return Err(Error::EmptyRing);
        }

        let idx = self.search(self.hasher.hash(key));
        self.positions
            .get(idx)
            .and_then(|position| self.ring.get(position))
            .map(String::as_str)
            .ok_or(Error::EmptyRing)
    }

    /// Copy the ring's positions grouped by server.
    ///
    /// Every member appears, even one whose positions were all taken over by
    /// collisions.
    pub fn snapshot(&self) -> RingSnapshot {
        let mut members: HashMap<ServerId, Vec<RingPosition>> = self
            .members
            .iter()
            .map(|m| (m.clone(), Vec::with_capacity(self.replicas)))
            .collect();

        for (position, owner) in &self.ring {
            members.entry(owner.clone()).or_default().push(*position);
        }

        RingSnapshot { members }
    }

    /// Verify the structural invariants.
    pub fn check_invariants(&self) -> bool {
        let sorted = self.positions.windows(2).all(|w| w[0] < w[1]);
        let mirrored = self.positions.len() == self.ring.len()
            && self.positions.iter().all(|p| self.ring.contains_key(p));
        let owned = self.ring.values().all(|owner| self.members.contains(owner));
        sorted && mirrored && owned
    }

    /// Index of the first position strictly greater than `hash`, wrapping to 0.
    fn search(&self, hash: RingPosition) -> usize {
        let idx = self.positions.partition_point(|&p| p <= hash);
        if idx == self.positions.len() {
            0
        } else {
            idx
        }
    }

    /// Rebuild the sorted positions from the position map.
    fn rebuild_positions(&mut self) {
        self.positions.clear();

        let needed = self.members.len() * self.replicas;
        if self.positions.capacity() > SHRINK_FACTOR * needed {
            self.positions = Vec::with_capacity(needed);
        }

        self.positions.extend(self.ring.keys().copied());
        self.positions.sort_unstable();
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS, Arc::new(CrcHasher::new()))
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("members", &self.members.len())
            .field("positions", &self.positions.len())
            .field("replicas", &self.replicas)
            .finish_non_exhaustive()
    }
}

/// Hash input for a server's `i`-th virtual node.
fn vnode_key(server: &str, i: usize) -> String {
    format!("{server}{i}")
}
