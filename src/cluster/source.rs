//! Membership sources: producers of join/leave notifications.
//!
//! A [`MembershipSource`] hands the ring a receive-only event stream. The
//! source owns shutdown: dropping every sender closes the stream, which stops
//! the ring's event consumer.

use tokio::sync::mpsc;

use crate::cluster::events::MemberEvent;
use crate::types::ServerId;

/// Default buffer for [`ChannelSource`], so a producer can emit a burst of
/// events before the consumer starts draining.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Receive side of a membership event stream.
pub type MemberEventReceiver = mpsc::Receiver<MemberEvent>;

/// A pluggable producer of membership events, such as a gossip layer.
pub trait MembershipSource: Send + 'static {
    /// Take the event stream.
    ///
    /// Returns `None` if the stream was already taken.
    fn events(&mut self) -> Option<MemberEventReceiver>;
}

/// In-process membership source backed by a bounded channel.
///
/// Used to bridge any membership protocol into the ring: the protocol side
/// keeps the [`MemberEventSender`] and reports joins and leaves through it.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Option<MemberEventReceiver>,
}

impl ChannelSource {
    /// Create a source with the default buffer.
    pub fn new() -> (Self, MemberEventSender) {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }

    /// Create a source buffering up to `buffer` events (at least one).
    pub fn with_buffer(buffer: usize) -> (Self, MemberEventSender) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { rx: Some(rx) }, MemberEventSender { tx })
    }
}

impl MembershipSource for ChannelSource {
    fn events(&mut self) -> Option<MemberEventReceiver> {
        self.rx.take()
    }
}

/// Producer half of a [`ChannelSource`].
///
/// Cloneable; the stream closes once every clone is dropped.
#[derive(Debug, Clone)]
pub struct MemberEventSender {
    tx: mpsc::Sender<MemberEvent>,
}

impl MemberEventSender {
    /// Send an event, waiting for buffer space.
    ///
    /// Returns the event back if the consumer has gone away.
    pub async fn send(&self, event: MemberEvent) -> Result<(), MemberEvent> {
        self.tx.send(event).await.map_err(|e| e.0)
    }

    /// Send an event from synchronous code, waiting for buffer space.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_send(&self, event: MemberEvent) -> Result<(), MemberEvent> {
        self.tx.blocking_send(event).map_err(|e| e.0)
    }

    /// Report a join.
    pub async fn join(&self, name: impl Into<ServerId>) -> Result<(), MemberEvent> {
        self.send(MemberEvent::join(name)).await
    }

    /// Report a leave.
    pub async fn leave(&self, name: impl Into<ServerId>) -> Result<(), MemberEvent> {
        self.send(MemberEvent::leave(name)).await
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
