//! The event bus: bounded ring, bounded subscriber queues, heartbeats.

use crate::event::{Event, EventKind};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Subscriber identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bus sizing and heartbeat cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Ring buffer capacity: how many recent events replay/recent can see.
    pub ring_capacity: usize,

    /// Per-subscriber outbound queue capacity.
    pub subscriber_queue_capacity: usize,

    /// Heartbeat interval in seconds.
    pub heartbeat_seconds: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 1000,
            subscriber_queue_capacity: 64,
            heartbeat_seconds: 15,
        }
    }
}

struct Slot {
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    dropped: AtomicU64,
}

struct Inner {
    config: BusConfig,
    /// Ring of the last `ring_capacity` events. The ring lock also serializes
    /// fan-out, so every subscriber enqueues events in one global publication
    /// order.
    ring: Mutex<VecDeque<Event>>,
    subscribers: DashMap<SubscriberId, Arc<Slot>>,
}

/// Single-process publish/subscribe bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                ring: Mutex::new(VecDeque::with_capacity(config.ring_capacity)),
                config,
                subscribers: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Append to the ring and fan out. O(1) per subscriber, never blocks the
    /// publisher: a full subscriber queue drops its oldest event and counts
    /// the drop against that subscriber alone.
    pub fn publish(&self, event: Event) {
        let mut ring = self.inner.ring.lock();
        if ring.len() >= self.inner.config.ring_capacity {
            ring.pop_front();
        }
        ring.push_back(event.clone());

        for entry in self.inner.subscribers.iter() {
            let slot = entry.value();
            {
                let mut queue = slot.queue.lock();
                if queue.len() >= self.inner.config.subscriber_queue_capacity {
                    queue.pop_front();
                    slot.dropped.fetch_add(1, Ordering::Relaxed);
                }
                queue.push_back(event.clone());
            }
            slot.notify.notify_one();
        }
    }

    /// Subscribe to future events, optionally replaying the last `replay`
    /// events already in the ring.
    pub fn subscribe(&self, replay: usize) -> Subscription {
        let id = SubscriberId::new();
        let slot = Arc::new(Slot {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        });

        // Seed under the ring lock so no event published during registration
        // is duplicated or missed.
        {
            let ring = self.inner.ring.lock();
            let replay = replay
                .min(ring.len())
                .min(self.inner.config.subscriber_queue_capacity);
            let mut queue = slot.queue.lock();
            for event in ring.iter().skip(ring.len() - replay) {
                queue.push_back(event.clone());
            }
            drop(queue);
            self.inner.subscribers.insert(id, slot.clone());
        }

        debug!("subscriber {} registered", id);
        Subscription {
            id,
            slot,
            inner: self.inner.clone(),
        }
    }

    /// Snapshot of the most recent events, oldest first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        let ring = self.inner.ring.lock();
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

/// A live feed of events. Dropping the subscription releases its slot.
pub struct Subscription {
    id: SubscriberId,
    slot: Arc<Slot>,
    inner: Arc<Inner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receive the next event, waiting if the queue is empty.
    pub async fn next(&mut self) -> Event {
        loop {
            if let Some(event) = self.slot.queue.lock().pop_front() {
                return event;
            }
            self.slot.notify.notified().await;
        }
    }

    /// Receive an event without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        self.slot.queue.lock().pop_front()
    }

    /// How many events were dropped because this subscriber fell behind.
    pub fn dropped(&self) -> u64 {
        self.slot.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.subscribers.remove(&self.id);
        debug!("subscriber {} released", self.id);
    }
}

/// Emit a synthetic heartbeat on a fixed interval so push-channel clients can
/// detect dead connections.
pub fn spawn_heartbeat(bus: EventBus) -> JoinHandle<()> {
    let period = Duration::from_secs(bus.config().heartbeat_seconds.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            bus.publish(Event::new(EventKind::Heartbeat, serde_json::json!({})));
        }
    })
}
