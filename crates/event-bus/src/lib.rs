//! Progress event bus.
//!
//! Publishing never blocks and never fails the publisher: events sent with no
//! subscriber are dropped, and slow subscribers lose the oldest events
//! instead of holding up the run.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Deliver `event` to current subscribers, returning how many received it.
    fn publish(&self, event: E) -> usize;

    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory bus over a bounded broadcast channel.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    fn publish(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                trace!("progress event dropped: no subscribers");
                0
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Helper to materialise an mpsc receiver from the bus subscription
/// so callers can await events without handling broadcast semantics directly.
pub fn to_mpsc<E>(bus: &dyn EventBus<E>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    if tx.send(ev).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "progress subscriber lagged; events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = InMemoryBus::<u32>::new(4);
        assert_eq!(bus.publish(1), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = InMemoryBus::<u32>::new(8);
        let mut rx = bus.subscribe();
        bus.publish(1);
        bus.publish(2);
        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn slow_subscriber_never_blocks_publisher() {
        let bus = InMemoryBus::<u32>::new(2);
        let mut rx = bus.subscribe();
        for value in 0..10 {
            assert_eq!(bus.publish(value), 1);
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn mpsc_bridge_forwards_events() {
        let bus = InMemoryBus::<&'static str>::new(4);
        let mut rx = to_mpsc::<&str>(&*bus, 4);
        tokio::task::yield_now().await;
        bus.publish("plan");
        assert_eq!(rx.recv().await, Some("plan"));
    }
}
