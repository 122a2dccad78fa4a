//! Cluster membership: events, sources and the ring's event consumer.

pub mod consumer;
pub mod events;
pub mod source;

pub use consumer::{apply_event, ConsumerHandle, EventOutcome};
pub use events::{MemberEvent, MemberEventKind};
pub use source::{
    ChannelSource, MemberEventReceiver, MemberEventSender, MembershipSource, DEFAULT_EVENT_BUFFER,
};
