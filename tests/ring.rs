//! Ring behavior through the public API.

use std::collections::HashMap;
use std::sync::Arc;

use consistent::{
    ConsistentRing, CrcHasher, Error, HashRing, RingConfig, RingHasher, RingPosition,
    DEFAULT_REPLICAS,
};
use test_log::test;

/// Hashes keys from a fixed table, falling back to CRC.
struct TableHasher(HashMap<String, RingPosition>);

impl TableHasher {
    fn new(entries: &[(&str, RingPosition)]) -> Self {
        Self(entries.iter().map(|(k, p)| (k.to_string(), *p)).collect())
    }
}

impl RingHasher for TableHasher {
    fn hash(&self, key: &str) -> RingPosition {
        self.0.get(key).copied().unwrap_or_else(|| CrcHasher.hash(key))
    }
}

fn ring_with(servers: &[&str]) -> ConsistentRing {
    let ring = ConsistentRing::with_defaults();
    for s in servers {
        ring.add(s).unwrap();
    }
    ring
}

#[test]
fn two_servers_then_remove_first() {
    let ring = ring_with(&["srv0", "srv1"]);

    assert_eq!(ring.len(), 2);
    assert_eq!(ring.position_count(), 40);
    {
        let inner = ring.read();
        assert!(inner.positions().windows(2).all(|w| w[0] < w[1]));
        assert!(inner.check_invariants());
    }

    ring.remove("srv0").unwrap();

    assert_eq!(ring.len(), 1);
    assert_eq!(ring.position_count(), 20);
    let inner = ring.read();
    for p in inner.positions() {
        assert_eq!(inner.owner_at(*p), Some("srv1"));
    }
}

#[test]
fn lookups_are_deterministic() {
    let a = ring_with(&["alpha", "beta", "gamma", "delta"]);
    let b = ring_with(&["alpha", "beta", "gamma", "delta"]);

    for i in 0..1_000 {
        let key = format!("object/{i}");
        let owner = a.get(&key).unwrap();
        assert_eq!(a.get(&key).unwrap(), owner);
        assert_eq!(b.get(&key).unwrap(), owner);
    }
}

#[test]
fn removing_a_server_only_moves_its_keys() {
    let ring = ring_with(&["A", "B", "C"]);
    let keys: Vec<String> = (0..10_000).map(|i| format!("k{i}")).collect();
    let before: Vec<String> = keys.iter().map(|k| ring.get(k).unwrap()).collect();

    ring.remove("B").unwrap();

    let mut moved = 0;
    for (key, prior) in keys.iter().zip(&before) {
        let now = ring.get(key).unwrap();
        if &now != prior {
            assert_eq!(prior, "B", "{key} moved from {prior} to {now}");
            moved += 1;
        }
    }
    assert_eq!(moved, before.iter().filter(|o| *o == "B").count());
}

#[test]
fn adding_a_server_only_steals_keys() {
    let ring = ring_with(&["A", "B"]);
    let keys: Vec<String> = (0..10_000).map(|i| format!("k{i}")).collect();
    let before: Vec<String> = keys.iter().map(|k| ring.get(k).unwrap()).collect();

    ring.add("C").unwrap();

    for (key, prior) in keys.iter().zip(&before) {
        let now = ring.get(key).unwrap();
        if &now != prior {
            assert_eq!(now, "C", "{key} moved from {prior} to {now}");
        }
    }
}

#[test]
fn duplicate_add_leaves_state_unchanged() {
    let ring = ConsistentRing::with_defaults();
    ring.add("x").unwrap();
    let positions = ring.read().positions().to_vec();

    assert_eq!(ring.add("x"), Err(Error::AlreadyExists("x".into())));
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.position_count(), DEFAULT_REPLICAS);
    assert_eq!(ring.read().positions(), positions.as_slice());
}

#[test]
fn missing_remove_leaves_state_unchanged() {
    let ring = ring_with(&["x"]);
    assert_eq!(ring.remove("y"), Err(Error::NotFound("y".into())));
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.position_count(), DEFAULT_REPLICAS);
}

#[test]
fn empty_ring_is_reported() {
    let ring = ConsistentRing::with_defaults();
    for key in ["", "a", "user:1"] {
        assert_eq!(ring.get(key), Err(Error::EmptyRing));
    }
    assert!(ring.snapshot().is_empty());
}

#[test]
fn lookup_past_last_position_wraps_to_first() {
    let hasher = TableHasher::new(&[
        ("low0", 1_000),
        ("high0", u32::MAX),
        ("key-max", u32::MAX),
        ("key-mid", 5_000),
    ]);
    let config = RingConfig::new().with_replicas(1).with_hasher(hasher);
    let ring = ConsistentRing::new(config).unwrap();
    ring.add("low").unwrap();
    ring.add("high").unwrap();

    assert_eq!(ring.get("key-max").unwrap(), "low");
    assert_eq!(ring.get("key-mid").unwrap(), "high");
}

#[test]
fn key_on_a_position_belongs_to_the_next_one() {
    let hasher = TableHasher::new(&[("a0", 10), ("b0", 20), ("on-a", 10), ("on-b", 20)]);
    let config = RingConfig::new().with_replicas(1).with_hasher(hasher);
    let ring = ConsistentRing::new(config).unwrap();
    ring.add("a").unwrap();
    ring.add("b").unwrap();

    assert_eq!(ring.get("on-a").unwrap(), "b");
    assert_eq!(ring.get("on-b").unwrap(), "a");
}

#[test]
fn snapshot_serializes_grouped_positions() {
    let ring = ring_with(&["srv0", "srv1"]);
    let snapshot = ring.snapshot();

    assert_eq!(snapshot.server_count(), 2);
    assert_eq!(snapshot.total_positions(), 40);

    let json = serde_json::to_value(&snapshot).unwrap();
    let members = json["members"].as_object().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members["srv0"].as_array().unwrap().len(), DEFAULT_REPLICAS);

    let back: consistent::RingSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn existing_ring_can_be_wrapped() {
    let mut inner = HashRing::new(5, Arc::new(CrcHasher));
    inner.add("a").unwrap();

    let ring = ConsistentRing::from_ring(inner);
    assert_eq!(ring.replicas(), 5);
    assert_eq!(ring.metrics().snapshot().members, 1);
    assert_eq!(ring.get("k").unwrap(), "a");
}
