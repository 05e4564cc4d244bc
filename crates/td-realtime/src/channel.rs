//! Realtime reconciliation channel
//!
//! Consumes the push feed and applies each event to the shared store. After
//! every change that altered the store, the store generation is published on
//! a watch channel so the dashboard can schedule its recompute.

use std::sync::Arc;
use td_core::config::RealtimeConfig;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::types::Table;
use td_store::{Applied, ChangeEvent, SharedStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::error::{ChannelError, ChannelResult};
use crate::feed::PushFeed;
use crate::router::route_event;

pub struct RealtimeChannel {
    feed: Arc<dyn PushFeed>,
    store: SharedStore,
    tables: Vec<Table>,
    backoff: Backoff,
    changes: watch::Sender<u64>,
}

impl RealtimeChannel {
    pub fn new(feed: Arc<dyn PushFeed>, store: SharedStore, config: &RealtimeConfig) -> Self {
        let generation = store.read().generation();
        let (changes, _) = watch::channel(generation);
        Self {
            feed,
            store,
            tables: config.tables.clone(),
            backoff: Backoff::from_config(config),
            changes,
        }
    }

    /// Store generation after each pushed change that altered the store
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Apply one event; failures are logged and returned, never fatal
    pub fn handle_event(&self, event: &ChangeEvent) -> TdResult<Applied> {
        let outcome = {
            let mut store = self.store.write();
            route_event(&mut store, event).map(|applied| (applied, store.generation()))
        };

        match outcome {
            Ok((applied, generation)) => {
                debug!(
                    table = %event.table,
                    change = event.event_kind.as_str(),
                    ?applied,
                    "applied pushed change"
                );
                if applied.changed() {
                    self.changes.send_replace(generation);
                }
                Ok(applied)
            }
            Err(err) => {
                match &err {
                    TdError::UnknownTable(table) => {
                        error!(table = %table, "push event for a table the client does not mirror")
                    }
                    other => warn!(table = %event.table, error = %other, "could not apply pushed change"),
                }
                Err(err)
            }
        }
    }

    /// Consume the feed until cancelled, resubscribing when it drops
    ///
    /// Returns an error only when the configured attempt limit is exhausted.
    pub async fn run(mut self, cancel: CancellationToken) -> ChannelResult<()> {
        loop {
            match self.feed.subscribe(&self.tables).await {
                Ok(mut subscription) => {
                    self.backoff.reset();
                    info!(tables = ?self.tables, "subscribed to push feed");
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            event = subscription.next() => match event {
                                Some(event) => match self.handle_event(&event) {
                                    Ok(_) => {}
                                    // already logged; a rejected event leaves the subscription open
                                    Err(_) => {}
                                },
                                None => {
                                    warn!("push feed dropped the subscription");
                                    break;
                                }
                            },
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, attempt = self.backoff.attempts() + 1, "push feed subscribe failed");
                }
            }

            let Some(delay) = self.backoff.next_delay() else {
                let attempts = self.backoff.attempts();
                error!(attempts, "giving up on the push feed; serving last known rows");
                return Err(ChannelError::GaveUp { attempts });
            };
            debug!(delay_ms = delay.as_millis() as u64, "resubscribing after delay");
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run on the tokio runtime in the background
    pub fn spawn(self) -> RealtimeHandle {
        let cancel = CancellationToken::new();
        let changes = self.changes();
        let task = tokio::spawn(self.run(cancel.clone()));
        RealtimeHandle {
            cancel,
            changes,
            task,
        }
    }
}

pub struct RealtimeHandle {
    cancel: CancellationToken,
    changes: watch::Receiver<u64>,
    task: JoinHandle<ChannelResult<()>>,
}

impl RealtimeHandle {
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the channel and wait for it to finish
    pub async fn shutdown(self) -> ChannelResult<()> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| ChannelError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{MemoryPushFeed, Subscription};
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::{json, Value};
    use std::time::Duration;
    use td_core::config::AppConfig;
    use td_store::EntityStore;

    mock! {
        pub Feed {}

        #[async_trait]
        impl PushFeed for Feed {
            async fn subscribe(&self, tables: &[Table]) -> ChannelResult<Subscription>;
        }
    }

    fn config() -> RealtimeConfig {
        let mut config = AppConfig::default().realtime;
        config.reconnect_initial_delay_ms = 1;
        config.reconnect_max_delay_ms = 5;
        config
    }

    fn store() -> SharedStore {
        let store = EntityStore::shared();
        store.write().reset(Some(1));
        store
    }

    fn project_row(id: i64, name: &str) -> Value {
        json!({"id": id, "department_id": 1, "name": name})
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_handle_event_publishes_generation() {
        let store = store();
        let channel = RealtimeChannel::new(Arc::new(MemoryPushFeed::new()), store.clone(), &config());
        let mut changes = channel.changes();

        let event = ChangeEvent::insert(Table::Projects, project_row(3, "Website"));
        assert_eq!(channel.handle_event(&event), Ok(Applied::Inserted));
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), store.read().generation());

        assert_eq!(channel.handle_event(&event), Ok(Applied::Unchanged));
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_unknown_table_is_reported() {
        let store = store();
        let channel = RealtimeChannel::new(Arc::new(MemoryPushFeed::new()), store.clone(), &config());
        let mut event = ChangeEvent::insert(Table::Projects, project_row(3, "Website"));
        event.table = "audit_log".to_string();

        assert!(matches!(channel.handle_event(&event), Err(TdError::UnknownTable(_))));
        assert!(store.read().projects().is_empty());
    }

    #[tokio::test]
    async fn test_resubscribes_after_drop() {
        let feed = Arc::new(MemoryPushFeed::new());
        let store = store();
        let handle = RealtimeChannel::new(feed.clone(), store.clone(), &config()).spawn();

        eventually(|| feed.subscriptions() == 1).await;
        feed.publish(ChangeEvent::insert(Table::Projects, project_row(3, "Website")));
        eventually(|| store.read().projects().len() == 1).await;

        feed.disconnect();
        eventually(|| feed.subscriptions() == 2).await;
        feed.publish(ChangeEvent::insert(Table::Projects, project_row(4, "Backend")));
        eventually(|| store.read().projects().len() == 2).await;

        assert_eq!(handle.shutdown().await, Ok(()));
    }

    #[tokio::test]
    async fn test_rejected_event_keeps_the_subscription() {
        let feed = Arc::new(MemoryPushFeed::new());
        let store = store();
        let handle = RealtimeChannel::new(feed.clone(), store.clone(), &config()).spawn();

        eventually(|| feed.subscriptions() == 1).await;
        let mut unknown = ChangeEvent::insert(Table::Projects, project_row(3, "Website"));
        unknown.table = "audit_log".to_string();
        feed.publish(unknown);
        feed.publish(ChangeEvent::insert(Table::Projects, project_row(4, "Backend")));

        eventually(|| store.read().projects().len() == 1).await;
        assert_eq!(store.read().projects()[0].id, 4);
        assert_eq!(feed.subscriptions(), 1);
        assert!(!handle.is_finished());
        assert_eq!(handle.shutdown().await, Ok(()));
    }

    #[tokio::test]
    async fn test_gives_up_after_attempt_limit() {
        let feed = Arc::new(MemoryPushFeed::new());
        feed.refuse_next(10);
        let mut config = config();
        config.max_reconnect_attempts = 3;

        let result = RealtimeChannel::new(feed.clone(), store(), &config)
            .run(CancellationToken::new())
            .await;
        assert_eq!(result, Err(ChannelError::GaveUp { attempts: 3 }));
        assert_eq!(feed.subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_subscribes_to_configured_tables() {
        let mut feed = MockFeed::new();
        feed.expect_subscribe()
            .withf(|tables| tables.to_vec() == vec![Table::Tasks, Table::TeamMembers, Table::Projects])
            .times(2)
            .returning(|_| Err(ChannelError::Subscribe("offline".to_string())));
        let mut config = config();
        config.max_reconnect_attempts = 1;

        let result = RealtimeChannel::new(Arc::new(feed), store(), &config)
            .run(CancellationToken::new())
            .await;
        assert_eq!(result, Err(ChannelError::GaveUp { attempts: 1 }));
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let feed = Arc::new(MemoryPushFeed::new());
        feed.refuse_next(u32::MAX);
        let mut config = config();
        config.reconnect_initial_delay_ms = 60_000;
        config.reconnect_max_delay_ms = 60_000;

        let handle = RealtimeChannel::new(feed, store(), &config).spawn();
        assert_eq!(handle.shutdown().await, Ok(()));
    }
}
