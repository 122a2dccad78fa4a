//! Point-in-time view of ring contents, grouped by server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{RingPosition, ServerId};

/// An independent copy of the ring's virtual-node positions, keyed by server.
///
/// Taken under the ring lock and then detached: it can be read or serialized
/// without holding any lock and is never updated afterwards. Position order
/// within a server is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSnapshot {
    /// Virtual-node positions owned by each server.
    pub members: HashMap<ServerId, Vec<RingPosition>>,
}

impl RingSnapshot {
    /// Number of servers in the snapshot.
    pub fn server_count(&self) -> usize {
        self.members.len()
    }

    /// Whether the snapshot has no servers.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Positions owned by `server`, if it is present.
    pub fn positions(&self, server: &str) -> Option<&[RingPosition]> {
        self.members.get(server).map(|p| p.as_slice())
    }

    /// Total number of virtual-node positions across all servers.
    pub fn total_positions(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    /// Consume the snapshot, returning the underlying map.
    pub fn into_members(self) -> HashMap<ServerId, Vec<RingPosition>> {
        self.members
    }
}
