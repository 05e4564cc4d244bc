//! Wiring from configuration
//!
//! Builds a dashboard over the in-memory collaborators: the memory gateway
//! doubles as the push feed and the identity provider keeps its accounts in
//! process. The active-team preference goes to the configured file.

use anyhow::Context;
use std::sync::Arc;
use td_auth::{FilePreferenceStore, MemoryIdentity, PreferenceStore, SessionManager};
use td_core::config::AppConfig;
use td_core::traits::{Clock, SystemClock};
use td_realtime::{RealtimeChannel, RealtimeHandle};
use td_store::{EntityStore, MemoryGateway, SharedStore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dashboard::Dashboard;
use crate::renderer::Renderer;

pub struct App {
    pub config: AppConfig,
    pub gateway: Arc<MemoryGateway>,
    pub identity: Arc<MemoryIdentity>,
    pub store: SharedStore,
    pub dashboard: Arc<Dashboard>,
    realtime: Option<(RealtimeHandle, JoinHandle<()>)>,
}

impl App {
    /// `.env`, then `TASKDESK__*` overrides over the defaults
    pub fn load_config() -> anyhow::Result<AppConfig> {
        dotenvy::dotenv().ok();
        let config = AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load configuration; using defaults");
            AppConfig::default()
        });
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    pub fn in_memory(config: AppConfig, renderer: Arc<dyn Renderer>) -> anyhow::Result<Self> {
        Self::with_clock(config, renderer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AppConfig,
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let gateway = Arc::new(MemoryGateway::new());
        let identity = Arc::new(MemoryIdentity::new());
        let store = EntityStore::shared();
        let preferences: Arc<dyn PreferenceStore> =
            Arc::new(FilePreferenceStore::new(&config.preferences.path));

        let session = Arc::new(SessionManager::new(
            identity.clone(),
            gateway.clone(),
            store.clone(),
            preferences,
        ));
        let dashboard = Dashboard::new(
            session,
            gateway.clone(),
            store.clone(),
            clock,
            renderer,
            &config.dashboard,
        )
        .context("building the dashboard")?;

        Ok(Self {
            config,
            gateway,
            identity,
            store,
            dashboard: Arc::new(dashboard),
            realtime: None,
        })
    }

    /// Start the push channel when enabled; the dashboard flushes on each change
    pub fn start_realtime(&mut self) {
        if !self.config.realtime.enabled {
            info!("realtime disabled");
            return;
        }
        if self.realtime.is_some() {
            return;
        }
        let channel = RealtimeChannel::new(self.gateway.clone(), self.store.clone(), &self.config.realtime);
        let handle = channel.spawn();
        let watcher = self.dashboard.watch_realtime(handle.changes());
        self.realtime = Some((handle, watcher));
    }

    pub fn is_realtime_running(&self) -> bool {
        self.realtime
            .as_ref()
            .is_some_and(|(handle, _)| !handle.is_finished())
    }

    pub async fn shutdown(self) -> anyhow::Result<()> {
        if let Some((handle, watcher)) = self.realtime {
            watcher.abort();
            handle.shutdown().await.context("stopping the realtime channel")?;
        }
        info!("shut down");
        Ok(())
    }
}
