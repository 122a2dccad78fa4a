//! Shared, lock-guarded handle to a hash ring.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::info;

use crate::cluster::consumer::{self, ConsumerHandle};
use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::metrics::RingMetrics;
use crate::partitioning::hashring::HashRing;
use crate::partitioning::snapshot::RingSnapshot;
use crate::types::ServerId;

/// A consistent hashing ring safe to share between threads and tasks.
///
/// One reader/writer lock covers the member set, the position map and the
/// sorted positions together. `add` and `remove` hold it exclusively for
/// their whole duration, so `get` and `snapshot`, which take it shared,
/// never observe a half-applied change.
///
/// Cloning is cheap and yields another handle to the same ring.
#[derive(Clone)]
pub struct ConsistentRing {
    ring: Arc<RwLock<HashRing>>,
    metrics: Arc<RingMetrics>,
    consumer: Option<Arc<ConsumerHandle>>,
}

impl ConsistentRing {
    /// Build a ring from `config`.
    ///
    /// If a membership source is configured, its event stream is taken and a
    /// consumer task is spawned on the current Tokio runtime. Fails with
    /// [`Error::Config`] on an invalid replica count, a source whose stream was
    /// already taken, or a source configured outside a runtime.
    pub fn new(mut config: RingConfig) -> Result<Self> {
        config.validate()?;

        let mut ring = Self::from_ring(HashRing::new(config.replicas, config.hasher.clone()));

        if let Some(mut source) = config.membership.take() {
            let runtime = Handle::try_current().map_err(|_| {
                Error::Config("membership source requires a running Tokio runtime".into())
            })?;
            let events = source.events().ok_or_else(|| {
                Error::Config("membership source event stream was already taken".into())
            })?;

            let handle = consumer::spawn(&runtime, ring.detached(), source, events);
            ring.consumer = Some(Arc::new(handle));
        }

        info!(
            replicas = config.replicas,
            membership = ring.consumer.is_some(),
            "consistent ring created"
        );
        Ok(ring)
    }

    /// A ring with default settings and no membership source.
    pub fn with_defaults() -> Self {
        Self::from_ring(HashRing::default())
    }

    /// Wrap an existing ring.
    pub fn from_ring(ring: HashRing) -> Self {
        let metrics = RingMetrics::new();
        metrics.members.set(ring.len() as i64);
        metrics.positions.set(ring.position_count() as i64);

        Self {
            ring: Arc::new(RwLock::new(ring)),
            metrics: Arc::new(metrics),
            consumer: None,
        }
    }

    /// Add a server to the ring.
    ///
    /// Fails with [`Error::AlreadyExists`] if it is already a member, in which
    /// case the ring is unchanged.
    pub fn add(&self, server: &str) -> Result<()> {
        let mut ring = self.ring.write();
        match ring.add(server) {
            Ok(gained) => {
                let collisions = ring.replicas() - gained;
                self.record_shape(&ring);
                drop(ring);

                self.metrics.adds.inc();
                self.metrics.collisions.inc_by(collisions as u64);
                Ok(())
            }
            Err(e) => {
                drop(ring);
                self.metrics.rejected_mutations.inc();
                Err(e)
            }
        }
    }

    /// Remove a server from the ring.
    ///
    /// Fails with [`Error::NotFound`] if it is not a member, in which case the
    /// ring is unchanged.
    pub fn remove(&self, server: &str) -> Result<()> {
        let mut ring = self.ring.write();
        match ring.remove(server) {
            Ok(()) => {
                self.record_shape(&ring);
                drop(ring);

                self.metrics.removes.inc();
                Ok(())
            }
            Err(e) => {
                drop(ring);
                self.metrics.rejected_mutations.inc();
                Err(e)
            }
        }
    }

    /// Find the server owning `key`.
    ///
    /// Fails with [`Error::EmptyRing`] when there are no servers.
    pub fn get(&self, key: &str) -> Result<ServerId> {
        self.metrics.lookups.inc();

        let result = self.ring.read().get(key).map(str::to_owned);
        if matches!(result, Err(Error::EmptyRing)) {
            self.metrics.empty_lookups.inc();
        }
        result
    }

    /// Copy the ring's positions grouped by server.
    pub fn snapshot(&self) -> RingSnapshot {
        self.ring.read().snapshot()
    }

    /// Number of servers in the ring.
    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    /// Whether the ring has no servers.
    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    /// Check if a server is in the ring.
    pub fn contains(&self, server: &str) -> bool {
        self.ring.read().contains(server)
    }

    /// All servers in the ring, sorted.
    pub fn members(&self) -> Vec<ServerId> {
        self.ring.read().members()
    }

    /// Number of virtual nodes generated per server.
    pub fn replicas(&self) -> usize {
        self.ring.read().replicas()
    }

    /// Number of occupied ring positions.
    pub fn position_count(&self) -> usize {
        self.ring.read().position_count()
    }

    /// Read access to the underlying ring.
    ///
    /// Holds the shared lock until the guard is dropped, blocking writers.
    pub fn read(&self) -> impl Deref<Target = HashRing> + '_ {
        self.ring.read()
    }

    /// Operational metrics.
    pub fn metrics(&self) -> &RingMetrics {
        &self.metrics
    }

    /// The membership event consumer, if a source was configured.
    pub fn consumer(&self) -> Option<&ConsumerHandle> {
        self.consumer.as_deref()
    }

    /// Another handle to the same ring, without the consumer handle.
    ///
    /// Given to the consumer task so it does not keep its own handle alive.
    fn detached(&self) -> Self {
        Self {
            ring: self.ring.clone(),
            metrics: self.metrics.clone(),
            consumer: None,
        }
    }

    fn record_shape(&self, ring: &HashRing) {
        self.metrics.members.set(ring.len() as i64);
        self.metrics.positions.set(ring.position_count() as i64);
    }
}

impl Default for ConsistentRing {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ConsistentRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistentRing")
            .field("ring", &*self.ring.read())
            .field("consumer", &self.consumer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ChannelSource, MemberEventReceiver, MembershipSource};
    use crate::partitioning::RingHasher;
    use crate::types::{RingPosition, DEFAULT_REPLICAS};
    use std::thread;

    struct ConstHasher(RingPosition);

    impl RingHasher for ConstHasher {
        fn hash(&self, _key: &str) -> RingPosition {
            self.0
        }
    }

    struct TakenSource;

    impl MembershipSource for TakenSource {
        fn events(&mut self) -> Option<MemberEventReceiver> {
            None
        }
    }

    #[test]
    fn test_new_with_replicas() {
        let ring = ConsistentRing::new(RingConfig::new().with_replicas(30)).unwrap();
        assert_eq!(ring.replicas(), 30);
        assert!(ring.consumer().is_none());
    }

    #[test]
    fn test_new_rejects_zero_replicas() {
        let err = ConsistentRing::new(RingConfig::new().with_replicas(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_source_outside_runtime() {
        let (source, _tx) = ChannelSource::new();
        let config = RingConfig::new().with_membership_source(source);
        let err = ConsistentRing::new(config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_source_already_taken() {
        let err = ConsistentRing::new(RingConfig::new().with_membership_source(TakenSource))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_add_remove_get() {
        let ring = ConsistentRing::with_defaults();
        assert_eq!(ring.get("k"), Err(Error::EmptyRing));

        ring.add("srv0").unwrap();
        ring.add("srv1").unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.position_count(), 2 * DEFAULT_REPLICAS);

        ring.remove("srv0").unwrap();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get("k"), Ok("srv1".to_string()));
        assert!(ring.read().check_invariants());
    }

    #[test]
    fn test_errors_are_counted() {
        let ring = ConsistentRing::with_defaults();
        let _ = ring.get("k");
        ring.add("a").unwrap();
        assert_eq!(ring.add("a"), Err(Error::AlreadyExists("a".into())));
        assert_eq!(ring.remove("b"), Err(Error::NotFound("b".into())));

        let snap = ring.metrics().snapshot();
        assert_eq!(snap.lookups, 1);
        assert_eq!(snap.empty_lookups, 1);
        assert_eq!(snap.adds, 1);
        assert_eq!(snap.rejected_mutations, 2);
        assert_eq!(snap.members, 1);
        assert_eq!(snap.positions, DEFAULT_REPLICAS as i64);
    }

    #[test]
    fn test_collisions_are_counted() {
        let ring = ConsistentRing::new(
            RingConfig::new().with_replicas(3).with_hasher(ConstHasher(42)),
        )
        .unwrap();
        ring.add("a").unwrap();
        ring.add("b").unwrap();

        // Every virtual node lands on 42: a collides with itself twice, b three times.
        assert_eq!(ring.metrics().snapshot().collisions, 5);
        assert_eq!(ring.position_count(), 1);
        assert_eq!(ring.get("k"), Ok("b".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let ring = ConsistentRing::with_defaults();
        let other = ring.clone();
        other.add("a").unwrap();
        assert!(ring.contains("a"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let ring = ConsistentRing::with_defaults();
        ring.add("a").unwrap();
        let snap = ring.snapshot();
        ring.remove("a").unwrap();

        assert_eq!(snap.positions("a").map(<[u32]>::len), Some(DEFAULT_REPLICAS));
        assert!(ring.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let ring = ConsistentRing::with_defaults();
        ring.add("base").unwrap();

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let ring = ring.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let server = format!("w{w}-{i}");
                        ring.add(&server).unwrap();
                        if i % 2 == 0 {
                            ring.remove(&server).unwrap();
                        }
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|r| {
                let ring = ring.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let owner = ring.get(&format!("key-{r}-{i}")).unwrap();
                        assert!(!owner.is_empty());
                        let guard = ring.read();
                        assert!(guard.check_invariants());
                    }
                })
            })
            .collect();

        for h in writers.into_iter().chain(readers) {
            h.join().unwrap();
        }

        assert_eq!(ring.len(), 1 + 4 * 25);
        assert!(ring.read().check_invariants());
    }
}
