//! Background task applying membership events to a ring.
//!
//! The consumer drains a [`MembershipSource`]'s stream in delivery order and
//! calls the ring's regular `add`/`remove` entry points, so it is just another
//! caller of the ring. A failed or unrecognized event is logged and dropped;
//! nothing stops the consumer except the stream closing.

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::cluster::events::{MemberEvent, MemberEventKind};
use crate::cluster::source::{MemberEventReceiver, MembershipSource};
use crate::error::Result;
use crate::partitioning::ConsistentRing;

/// What the consumer did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The ring was mutated.
    Applied,
    /// The ring rejected the mutation (`AlreadyExists` or `NotFound`).
    Failed,
    /// The event kind is not acted on.
    Ignored,
}

/// Apply a single membership event to `ring`, logging anything that does not apply.
pub fn apply_event(ring: &ConsistentRing, event: &MemberEvent) -> EventOutcome {
    let metrics = ring.metrics();

    let result: Result<()> = match event.kind {
        MemberEventKind::Join => ring.add(&event.name),
        MemberEventKind::Leave => ring.remove(&event.name),
        kind => {
            warn!(%kind, server = %event.name, "ignoring membership event of unhandled kind");
            metrics.events_ignored.inc();
            return EventOutcome::Ignored;
        }
    };

    match result {
        Ok(()) => {
            debug!(
                kind = %event.kind,
                server = %event.name,
                addr = ?event.addr,
                port = ?event.port,
                "applied membership event"
            );
            metrics.events_applied.inc();
            EventOutcome::Applied
        }
        Err(e) => {
            warn!(
                kind = %event.kind,
                server = %event.name,
                addr = ?event.addr,
                port = ?event.port,
                error = %e,
                "failed to apply membership event"
            );
            metrics.events_failed.inc();
            EventOutcome::Failed
        }
    }
}

/// Handle to a running event consumer.
pub struct ConsumerHandle {
    abort: AbortHandle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConsumerHandle {
    /// Check whether the consumer task is still running.
    pub fn is_running(&self) -> bool {
        !self.abort.is_finished()
    }

    /// Stop the consumer without waiting for the stream to close.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Wait for the consumer to finish.
    ///
    /// Returns immediately if another caller already waited.
    pub async fn wait(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(error = %e, "membership event consumer panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for ConsumerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Spawn the consumer on `runtime`.
///
/// The task keeps `source` alive until the stream closes, so a source that
/// owns its sending half is not torn down early.
pub(crate) fn spawn(
    runtime: &Handle,
    ring: ConsistentRing,
    source: Box<dyn MembershipSource>,
    events: MemberEventReceiver,
) -> ConsumerHandle {
    let task = runtime.spawn(run(ring, source, events));
    ConsumerHandle {
        abort: task.abort_handle(),
        task: Mutex::new(Some(task)),
    }
}

async fn run(
    ring: ConsistentRing,
    source: Box<dyn MembershipSource>,
    mut events: MemberEventReceiver,
) {
    info!("membership event consumer started");

    while let Some(event) = events.recv().await {
        apply_event(&ring, &event);
    }

    drop(source);
    info!("membership event stream closed, consumer stopped");
}
