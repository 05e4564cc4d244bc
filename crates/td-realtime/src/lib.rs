//! # td-realtime
//!
//! Keeps the entity store in step with the remote change feed.
//!
//! Events are routed by table name to the matching store collection. A
//! dropped subscription never blocks local work: the store keeps serving the
//! last known rows while the channel resubscribes in the background.

pub mod error;
pub mod feed;
pub mod router;
pub mod backoff;
pub mod channel;

pub use error::{ChannelError, ChannelResult};
pub use feed::{MemoryPushFeed, PushFeed, Subscription};
pub use router::route_event;
pub use backoff::Backoff;
pub use channel::{RealtimeChannel, RealtimeHandle};
