//! Change broadcasting
//!
//! Publishing is fire-and-forget: no acknowledgement, no retry, and having no
//! subscribers is not an error. The pipeline receives a [`Broadcaster`] at
//! construction; the webserver subscribes to a [`ChannelBroadcaster`].

pub mod types;

pub use types::{BroadcastEvent, UpdatedBundle, UpdatedToken};

use crate::logger::{self, LogTag};
use tokio::sync::broadcast;

pub trait Broadcaster: Send + Sync {
    fn publish(&self, event: BroadcastEvent);
}

/// Used when no real-time transport is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn publish(&self, event: BroadcastEvent) {
        logger::debug(
            LogTag::Broadcast,
            &format!("No transport, dropping {}", event.name()),
        );
    }
}

/// In-process fan-out over `tokio::sync::broadcast`
///
/// Slow subscribers lag and lose old events; publishers never block.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: BroadcastEvent) {
        let name = event.name();
        // Err only means nobody is listening
        match self.sender.send(event) {
            Ok(receivers) => logger::debug(
                LogTag::Broadcast,
                &format!("Published {} to {} subscribers", name, receivers),
            ),
            Err(_) => logger::debug(
                LogTag::Broadcast,
                &format!("No subscribers for {}", name),
            ),
        }
    }
}
