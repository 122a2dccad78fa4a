//! Consistent hashing ring with virtual nodes and membership-driven updates.
//!
//! This crate assigns keys to a dynamic set of servers so that adding or
//! removing a server remaps only the keys that server owned. It is meant for
//! sharded caches, load balancers and partitioned services.
//!
//! # Features
//!
//! - Virtual nodes (20 per server by default) to smooth load across the ring
//! - Pluggable key hashing via [`RingHasher`] (CRC-32 by default)
//! - Thread-safe [`ConsistentRing`] handle, cheap to clone and share
//! - Optional background consumer applying join/leave events from a
//!   [`MembershipSource`](cluster::MembershipSource)
//! - Detached, serializable [`RingSnapshot`]s for observability
//!
//! # Example
//!
//! ```rust
//! use consistent::{ConsistentRing, Error, RingConfig};
//!
//! # fn main() -> Result<(), Error> {
//! let ring = ConsistentRing::new(RingConfig::new().with_replicas(50))?;
//!
//! assert_eq!(ring.get("user:123"), Err(Error::EmptyRing));
//!
//! ring.add("10.0.0.1:6379")?;
//! ring.add("10.0.0.2:6379")?;
//!
//! let owner = ring.get("user:123")?;
//! assert!(owner.starts_with("10.0.0."));
//!
//! // Only keys owned by the removed server move.
//! ring.remove("10.0.0.1:6379")?;
//! assert_eq!(ring.get("user:123")?, "10.0.0.2:6379");
//! # Ok(())
//! # }
//! ```
//!
//! # Membership events
//!
//! ```rust,no_run
//! use consistent::cluster::ChannelSource;
//! use consistent::{ConsistentRing, RingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (source, events) = ChannelSource::new();
//!     let ring = ConsistentRing::new(RingConfig::new().with_membership_source(source))?;
//!
//!     // A gossip layer reports membership changes through the sender.
//!     events.join("node-1").await.ok();
//!     events.join("node-2").await.ok();
//!
//!     // Dropping every sender stops the consumer.
//!     drop(events);
//!     if let Some(consumer) = ring.consumer() {
//!         consumer.wait().await;
//!     }
//!     println!("members: {:?}", ring.members());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────────────┐
//! │  direct callers  │   │   MembershipSource       │
//! │ add/remove/get   │   │  (gossip, discovery...)  │
//! └────────┬─────────┘   └────────────┬─────────────┘
//!          │                          │ MemberEvent stream
//!          │                          ▼
//!          │              ┌──────────────────────────┐
//!          │              │     event consumer       │
//!          │              │  Join → add, Leave →     │
//!          │              │  remove, else warn       │
//!          │              └────────────┬─────────────┘
//!          ▼                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                 ConsistentRing                       │
//! │   RwLock<HashRing>: members, position map, sorted    │
//! │   positions (one lock, one consistent unit)          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod metrics;
pub mod partitioning;
pub mod types;

pub use config::RingConfig;
pub use error::{Error, Result};
pub use types::{RingPosition, ServerId, DEFAULT_REPLICAS};

pub use cluster::{MemberEvent, MemberEventKind, MembershipSource};
pub use metrics::{RingMetrics, RingMetricsSnapshot};
pub use partitioning::{ConsistentRing, CrcHasher, HashRing, RingHasher, RingSnapshot};
