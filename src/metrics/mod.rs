//! Ring metrics for monitoring and observability.
//!
//! Counters and gauges are plain atomics. Gauges mirror ring shape and are set
//! while the ring's write lock is held, so they never run ahead of or behind
//! the ring. [`RingMetrics::to_prometheus`] renders everything in Prometheus
//! text exposition format.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug)]
pub struct Counter {
    name: &'static str,
    help: &'static str,
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicU64::new(0),
        }
    }

    /// Metric name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Metric help text.
    pub fn help(&self) -> &'static str {
        self.help
    }

    /// Increment by one.
    pub fn inc(&self) {
        self.inc_by(1);
    }

    /// Increment by `n`.
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A value that can go up and down.
#[derive(Debug)]
pub struct Gauge {
    name: &'static str,
    help: &'static str,
    value: AtomicI64,
}

impl Gauge {
    /// Create a new gauge.
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicI64::new(0),
        }
    }

    /// Metric name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Metric help text.
    pub fn help(&self) -> &'static str {
        self.help
    }

    /// Overwrite the value.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Operational metrics for one ring instance.
#[derive(Debug)]
pub struct RingMetrics {
    /// Successful server additions.
    pub adds: Counter,
    /// Successful server removals.
    pub removes: Counter,
    /// Additions or removals rejected as `AlreadyExists` / `NotFound`.
    pub rejected_mutations: Counter,
    /// Key lookups, successful or not.
    pub lookups: Counter,
    /// Lookups that found no server.
    pub empty_lookups: Counter,
    /// Virtual nodes that took over an occupied position.
    pub collisions: Counter,
    /// Membership events applied to the ring.
    pub events_applied: Counter,
    /// Membership events that failed to apply.
    pub events_failed: Counter,
    /// Membership events with a kind the ring does not act on.
    pub events_ignored: Counter,
    /// Current member count.
    pub members: Gauge,
    /// Current number of occupied ring positions.
    pub positions: Gauge,
}

impl RingMetrics {
    /// Create a zeroed metrics set.
    pub fn new() -> Self {
        Self {
            adds: Counter::new("ring_adds_total", "Servers added to the ring"),
            removes: Counter::new("ring_removes_total", "Servers removed from the ring"),
            rejected_mutations: Counter::new(
                "ring_rejected_mutations_total",
                "Add or remove calls rejected due to current membership",
            ),
            lookups: Counter::new("ring_lookups_total", "Key lookups"),
            empty_lookups: Counter::new("ring_empty_lookups_total", "Lookups on an empty ring"),
            collisions: Counter::new(
                "ring_vnode_collisions_total",
                "Virtual nodes that overwrote an occupied position",
            ),
            events_applied: Counter::new(
                "ring_events_applied_total",
                "Membership events applied to the ring",
            ),
            events_failed: Counter::new(
                "ring_events_failed_total",
                "Membership events that failed to apply",
            ),
            events_ignored: Counter::new(
                "ring_events_ignored_total",
                "Membership events with an unhandled kind",
            ),
            members: Gauge::new("ring_members", "Servers currently in the ring"),
            positions: Gauge::new("ring_positions", "Occupied ring positions"),
        }
    }

    /// Point-in-time copy of every value.
    pub fn snapshot(&self) -> RingMetricsSnapshot {
        RingMetricsSnapshot {
            adds: self.adds.get(),
            removes: self.removes.get(),
            rejected_mutations: self.rejected_mutations.get(),
            lookups: self.lookups.get(),
            empty_lookups: self.empty_lookups.get(),
            collisions: self.collisions.get(),
            events_applied: self.events_applied.get(),
            events_failed: self.events_failed.get(),
            events_ignored: self.events_ignored.get(),
            members: self.members.get(),
            positions: self.positions.get(),
        }
    }

    /// Format metrics in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        let counters = [
            &self.adds,
            &self.removes,
            &self.rejected_mutations,
            &self.lookups,
            &self.empty_lookups,
            &self.collisions,
            &self.events_applied,
            &self.events_failed,
            &self.events_ignored,
        ];
        for c in counters {
            let _ = writeln!(output, "# HELP {} {}", c.name(), c.help());
            let _ = writeln!(output, "# TYPE {} counter", c.name());
            let _ = writeln!(output, "{} {}", c.name(), c.get());
        }

        for g in [&self.members, &self.positions] {
            let _ = writeln!(output, "# HELP {} {}", g.name(), g.help());
            let _ = writeln!(output, "# TYPE {} gauge", g.name());
            let _ = writeln!(output, "{} {}", g.name(), g.get());
        }

        output
    }
}

impl Default for RingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-value copy of [`RingMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingMetricsSnapshot {
    pub adds: u64,
    pub removes: u64,
    pub rejected_mutations: u64,
    pub lookups: u64,
    pub empty_lookups: u64,
    pub collisions: u64,
    pub events_applied: u64,
    pub events_failed: u64,
    pub events_ignored: u64,
    pub members: i64,
    pub positions: i64,
}

impl RingMetricsSnapshot {
    /// Total membership events the consumer has seen.
    pub fn events_total(&self) -> u64 {
        self.events_applied + self.events_failed + self.events_ignored
    }
}
