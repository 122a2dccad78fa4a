//! Cluster membership events.

use std::fmt;
use std::net::IpAddr;

use crate::types::ServerId;

/// What happened to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberEventKind {
    /// The member joined the cluster.
    Join,
    /// The member left or was declared dead.
    Leave,
    /// The member's metadata changed. The ring does not act on it.
    Update,
}

impl fmt::Display for MemberEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberEventKind::Join => f.write_str("join"),
            MemberEventKind::Leave => f.write_str("leave"),
            MemberEventKind::Update => f.write_str("update"),
        }
    }
}

/// A membership change reported by a [`MembershipSource`](crate::cluster::MembershipSource).
///
/// Only `kind` and `name` drive ring mutations; the address and port are
/// carried for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEvent {
    /// The kind of change.
    pub kind: MemberEventKind,
    /// The member's server identifier.
    pub name: ServerId,
    /// The member's address, if the source knows it.
    pub addr: Option<IpAddr>,
    /// The member's port, if the source knows it.
    pub port: Option<u16>,
}

impl MemberEvent {
    /// A join event with no address information.
    pub fn join(name: impl Into<ServerId>) -> Self {
        Self::new(MemberEventKind::Join, name)
    }

    /// A leave event with no address information.
    pub fn leave(name: impl Into<ServerId>) -> Self {
        Self::new(MemberEventKind::Leave, name)
    }

    /// An update event with no address information.
    pub fn update(name: impl Into<ServerId>) -> Self {
        Self::new(MemberEventKind::Update, name)
    }

    /// Create an event of the given kind.
    pub fn new(kind: MemberEventKind, name: impl Into<ServerId>) -> Self {
        Self {
            kind,
            name: name.into(),
            addr: None,
            port: None,
        }
    }

    /// Attach the member's address and port.
    pub fn with_addr(mut self, addr: IpAddr, port: u16) -> Self {
        self.addr = Some(addr);
        self.port = Some(port);
        self
    }

    /// Check if this is a join event.
    pub fn is_join(&self) -> bool {
        self.kind == MemberEventKind::Join
    }

    /// Check if this is a leave event.
    pub fn is_leave(&self) -> bool {
        self.kind == MemberEventKind::Leave
    }
}
