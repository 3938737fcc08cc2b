//! Progress event bus for mode transitions.
//!
//! Phase updates are normalised into a single [`TransitionProgress`] value
//! and fanned out over tokio unbounded MPSC channels, one per subscriber.
//! The rendering layer subscribes and receives `(phase, message, percent)`
//! updates; dropping the receiver unsubscribes. Unbounded is appropriate
//! here because a transition emits a handful of events and the consumer is
//! a UI loop that always keeps up — if backpressure ever becomes a concern
//! the senders can be swapped for bounded channels at this one seam.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Phases a mode transition moves through, in order.
///
/// `Error` is terminal and only reported for *fatal* failures (conflict,
/// cancellation) — remote-freshness failures degrade the result instead
/// of erroring the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Starting,
    Recalculating,
    Updating,
    Completing,
    Error,
}

/// One progress update delivered to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionProgress {
    /// Identifies the transition this update belongs to (UUID v4 text).
    pub transition_id: String,
    pub phase: TransitionPhase,
    /// Human-readable phase description for the progress indicator.
    pub message: String,
    /// 0–100.
    pub percent: u8,
    /// Whether cancelling is still meaningful at this phase.
    pub cancellable: bool,
}

/// Multi-subscriber fan-out of transition progress.
///
/// The bus is owned by one `ModeTransitionManager`; subscribers hold only
/// receive halves. Closed receivers are pruned on the next emit, so an
/// unsubscribe is just a drop.
#[derive(Debug, Default)]
pub struct ProgressBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<TransitionProgress>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TransitionProgress> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Delivers `progress` to every live subscriber, pruning closed ones.
    pub fn emit(&self, progress: &TransitionProgress) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subs.retain(|tx| tx.send(progress.clone()).is_ok());
    }

    /// Live subscriber count (closed receivers are counted until the next
    /// emit prunes them).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
