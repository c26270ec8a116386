use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{ChangeEvent, ChangeOp, Collection};

use crate::models::{Appointment, ViewScope};
use crate::AppointmentState;

const DELTA_BUFFER: usize = 64;

/// A single observed change within a subscribed view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewDelta {
    Changed(Appointment),
    Removed(Uuid),
    /// The underlying change feed overflowed and deltas were lost. Terminal:
    /// the view can no longer be trusted and the consumer must resubscribe.
    Lagged,
}

/// Owns the forwarding task for one subscription. Dropping it (or calling
/// `cancel`) tears the task down without touching stored data.
pub struct SubscriptionGuard {
    task: JoinHandle<()>,
}

impl SubscriptionGuard {
    pub fn cancel(self) {}
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An initial snapshot plus an ordered stream of in-scope deltas. The
/// snapshot and the feed subscription are taken atomically, so the first
/// delta is always the first commit after the snapshot.
pub struct AppointmentSubscription {
    pub snapshot: Vec<Appointment>,
    receiver: mpsc::Receiver<ViewDelta>,
    guard: SubscriptionGuard,
}

impl AppointmentSubscription {
    /// Next delta, or `None` once the stream has terminated.
    pub async fn recv(&mut self) -> Option<ViewDelta> {
        self.receiver.recv().await
    }

    pub fn cancel(self) {
        self.guard.cancel();
    }

    pub fn into_parts(self) -> (Vec<Appointment>, mpsc::Receiver<ViewDelta>, SubscriptionGuard) {
        (self.snapshot, self.receiver, self.guard)
    }
}

/// Produces role-scoped, continuously updated appointment views. Scope
/// filtering is fixed when the subscription is created; a caller whose role
/// changes later keeps only the view it was granted until it resubscribes.
pub struct LiveViewService {
    appointments: Arc<Collection<Uuid, Appointment>>,
}

impl LiveViewService {
    pub fn new(state: &AppointmentState) -> Self {
        Self::with_parts(Arc::clone(&state.appointments))
    }

    pub fn with_parts(appointments: Arc<Collection<Uuid, Appointment>>) -> Self {
        Self { appointments }
    }

    /// Subscribe to a view. The caller is responsible for having authorized
    /// `scope` against the requesting identity (see `ViewScope::authorize`).
    pub async fn subscribe(&self, scope: ViewScope) -> AppointmentSubscription {
        let (snapshot, feed) = self.appointments.watch().await;

        let mut snapshot: Vec<Appointment> = snapshot
            .into_iter()
            .map(|stored| stored.record)
            .filter(|a| scope.includes(a))
            .collect();
        snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let (tx, rx) = mpsc::channel(DELTA_BUFFER);
        let task = tokio::spawn(forward_deltas(feed, tx, scope));

        AppointmentSubscription {
            snapshot,
            receiver: rx,
            guard: SubscriptionGuard { task },
        }
    }
}

async fn forward_deltas(
    mut feed: broadcast::Receiver<ChangeEvent<Uuid, Appointment>>,
    tx: mpsc::Sender<ViewDelta>,
    scope: ViewScope,
) {
    loop {
        match feed.recv().await {
            Ok(event) => {
                if !scope.includes(&event.record) {
                    continue;
                }

                let delta = match event.op {
                    ChangeOp::Removed => ViewDelta::Removed(event.key),
                    ChangeOp::Created | ChangeOp::Updated => ViewDelta::Changed(event.record),
                };

                if tx.send(delta).await.is_err() {
                    debug!("View subscriber went away, stopping forwarder");
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                // Fail loudly rather than silently serving a stale view.
                warn!("View subscription lagged by {} events, terminating", missed);
                let _ = tx.send(ViewDelta::Lagged).await;
                break;
            }
            Err(RecvError::Closed) => break,
        }
    }
}
