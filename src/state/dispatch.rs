//! Sequential dispatch of server events.
//!
//! The [`Dispatcher`] owns the current snapshot and folds events into it one
//! at a time, publishing every result to its subscribers before taking the
//! next event. Transport threads never touch it directly; they push raw
//! envelopes into an [`Inbox`] and the dispatcher drains the queue in
//! arrival order.
//!
//! ```text
//! transport ──▶ Inbox ──▶ InboxReceiver ──▶ Dispatcher ──▶ subscribers
//!  (any thread)     (one ordered queue)     decode + reduce   (views)
//! ```

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::event::{Envelope, Event, EventError};
use super::reducer::try_reduce;
use super::snapshot::Snapshot;
use crate::config::DispatchConfig;

/// Callback invoked with every published snapshot.
pub type Subscriber = Box<dyn FnMut(&Arc<Snapshot>) + Send>;

/// Handle returned by [`Dispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// What happened to one dispatched event.
#[derive(Debug)]
pub enum Outcome {
    /// Folded into the snapshot
    Applied,
    /// Kind not recognized; snapshot unchanged
    Ignored { name: String },
    /// Malformed or inapplicable; snapshot unchanged
    Rejected(EventError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Outcome counts for a batch of envelopes taken from the inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub ignored: usize,
    pub rejected: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Ignored { .. } => self.ignored += 1,
            Outcome::Rejected(_) => self.rejected += 1,
        }
    }

    /// Envelopes processed, whatever their outcome.
    pub fn total(&self) -> usize {
        self.applied + self.ignored + self.rejected
    }
}

/// Error when the dispatcher side of the inbox is gone.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher inbox is closed")]
    Closed,
}

/// Sending half of the event queue. Cheap to clone, safe to share across
/// transport threads.
#[derive(Debug, Clone)]
pub struct Inbox {
    sender: Sender<Envelope>,
}

impl Inbox {
    /// Queue an envelope for dispatch. Blocks while a bounded inbox is full.
    pub fn send(&self, envelope: Envelope) -> Result<(), DispatchError> {
        self.sender.send(envelope).map_err(|_| DispatchError::Closed)
    }
}

/// Receiving half of the event queue, consumed by [`Dispatcher::run`].
pub type InboxReceiver = Receiver<Envelope>;

/// Create the event queue, bounded if the config sets a capacity.
pub fn channel(config: &DispatchConfig) -> (Inbox, InboxReceiver) {
    let (sender, receiver) = match config.inbox_capacity {
        Some(capacity) => crossbeam_channel::bounded(capacity),
        None => crossbeam_channel::unbounded(),
    };
    (Inbox { sender }, receiver)
}

/// Owns the snapshot for one session and applies events to it in order.
pub struct Dispatcher {
    current: Arc<Snapshot>,
    subscribers: Vec<(Subscription, Subscriber)>,
    next_subscription: u64,
    /// Events processed so far
    sequence: u64,
    trace_snapshots: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&DispatchConfig::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sequence", &self.sequence)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher starting from [`Snapshot::initial`].
    pub fn new(config: &DispatchConfig) -> Self {
        Self::with_snapshot(config, Snapshot::initial())
    }

    /// Create a dispatcher starting from an existing snapshot.
    pub fn with_snapshot(config: &DispatchConfig, snapshot: Snapshot) -> Self {
        Self {
            current: Arc::new(snapshot),
            subscribers: Vec::new(),
            next_subscription: 0,
            sequence: 0,
            trace_snapshots: config.trace_snapshots,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Number of events processed, including dropped ones.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Register a view. It is called once per processed event, after any
    /// subscribers registered before it.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&Arc<Snapshot>) + Send + 'static,
    {
        let id = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a view. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Decode and apply one envelope, then publish.
    pub fn dispatch(&mut self, envelope: &Envelope) -> Outcome {
        self.sequence += 1;

        let outcome = match Event::decode(envelope) {
            Ok(event) => self.fold(event),
            Err(EventError::UnknownKind { name }) => {
                debug!(seq = self.sequence, event = %name, "Ignoring unknown event");
                Outcome::Ignored { name }
            }
            Err(err) => Outcome::Rejected(err),
        };

        if let Outcome::Rejected(err) = &outcome {
            warn!(
                seq = self.sequence,
                event = %envelope.event,
                received_at = %envelope.received_at,
                error = %err,
                "Dropping event"
            );
        }

        self.publish();
        outcome
    }

    /// Apply an already-typed event, then publish.
    pub fn apply(&mut self, event: Event) -> Outcome {
        self.sequence += 1;
        let kind = event.kind();

        let outcome = self.fold(event);
        if let Outcome::Rejected(err) = &outcome {
            warn!(seq = self.sequence, %kind, error = %err, "Dropping event");
        }

        self.publish();
        outcome
    }

    /// Process everything already queued without blocking.
    pub fn drain(&mut self, inbox: &InboxReceiver) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Ok(envelope) = inbox.try_recv() {
            summary.record(&self.dispatch(&envelope));
        }
        summary
    }

    /// Process envelopes until every [`Inbox`] has been dropped.
    pub fn run(&mut self, inbox: &InboxReceiver) -> RunSummary {
        let mut summary = RunSummary::default();
        for envelope in inbox.iter() {
            summary.record(&self.dispatch(&envelope));
        }
        debug!(processed = summary.total(), "Inbox closed");
        summary
    }

    fn fold(&mut self, event: Event) -> Outcome {
        let kind = event.kind();
        match try_reduce(&self.current, event) {
            Ok(next) => {
                debug!(seq = self.sequence, %kind, "Applied event");
                self.current = Arc::new(next);
                Outcome::Applied
            }
            Err(err) => Outcome::Rejected(err),
        }
    }

    fn publish(&mut self) {
        if self.trace_snapshots {
            trace!(seq = self.sequence, snapshot = %self.current.to_json(), "Publishing snapshot");
        }
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.current);
        }
    }
}
