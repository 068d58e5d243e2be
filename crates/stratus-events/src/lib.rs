//! # Stratus Events
//!
//! Single-process publish/subscribe bus: a bounded ring buffer of recent
//! events plus per-subscriber bounded queues with drop-oldest overflow, so a
//! slow consumer can never stall publishers or its peers.
//!
//! The bus is a value owned by the process entry point and handed to
//! components by constructor injection; there is no global state.

pub mod bus;
pub mod event;

pub use bus::{spawn_heartbeat, BusConfig, EventBus, SubscriberId, Subscription};
pub use event::{Event, EventId, EventKind};
