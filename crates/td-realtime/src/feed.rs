//! Push feed collaborator
//!
//! A subscription is a stream of [`ChangeEvent`]s for a set of tables. The
//! stream ending means the feed dropped the subscription.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use td_core::types::Table;
use td_store::{ChangeEvent, MemoryGateway};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::error::{ChannelError, ChannelResult};

#[async_trait]
pub trait PushFeed: Send + Sync {
    async fn subscribe(&self, tables: &[Table]) -> ChannelResult<Subscription>;
}

pub struct Subscription {
    events: BoxStream<'static, ChangeEvent>,
}

impl Subscription {
    pub fn new(events: BoxStream<'static, ChangeEvent>) -> Self {
        Self { events }
    }

    /// Events from a broadcast channel, restricted to `tables`
    ///
    /// Events naming a table the client does not know are passed through so
    /// the receiver can report them.
    pub fn from_broadcast(receiver: broadcast::Receiver<ChangeEvent>, tables: &[Table]) -> Self {
        let tables = tables.to_vec();
        let events = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "push feed subscriber lagged; events were lost");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .filter(move |event| {
            let wanted = Table::from_name(&event.table)
                .map(|table| tables.contains(&table))
                .unwrap_or(true);
            futures::future::ready(wanted)
        })
        .boxed();
        Self::new(events)
    }

    /// Next event; `None` once the feed has dropped the subscription
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.next().await
    }
}

/// Every write made through the in-memory gateway, as a push feed
#[async_trait]
impl PushFeed for MemoryGateway {
    async fn subscribe(&self, tables: &[Table]) -> ChannelResult<Subscription> {
        Ok(Subscription::from_broadcast(
            MemoryGateway::subscribe(self),
            tables,
        ))
    }
}

/// Hand-driven feed for tests and demos
pub struct MemoryPushFeed {
    sender: Mutex<broadcast::Sender<ChangeEvent>>,
    refusals: AtomicU32,
    subscriptions: AtomicU32,
}

impl Default for MemoryPushFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPushFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender: Mutex::new(sender),
            refusals: AtomicU32::new(0),
            subscriptions: AtomicU32::new(0),
        }
    }

    /// Deliver an event; returns the number of live subscriptions
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.lock().send(event).unwrap_or(0)
    }

    /// Drop every live subscription
    pub fn disconnect(&self) {
        let (sender, _) = broadcast::channel(256);
        *self.sender.lock() = sender;
    }

    /// Refuse the next `count` subscribe calls
    pub fn refuse_next(&self, count: u32) {
        self.refusals.store(count, Ordering::SeqCst);
    }

    /// Successful subscribe calls so far
    pub fn subscriptions(&self) -> u32 {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushFeed for MemoryPushFeed {
    async fn subscribe(&self, tables: &[Table]) -> ChannelResult<Subscription> {
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ChannelError::Subscribe("connection refused".to_string()));
        }

        let receiver = self.sender.lock().subscribe();
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(Subscription::from_broadcast(receiver, tables))
    }
}
