//! Configuration types and loading

use serde::{Deserialize, Serialize};

use crate::error::TdError;
use crate::result::TdResult;
use crate::types::Table;

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Remote relational store connection
    pub store: StoreConfig,

    /// Push feed subscription settings
    pub realtime: RealtimeConfig,

    /// Locally persisted preferences
    pub preferences: PreferencesConfig,

    /// Dashboard defaults
    pub dashboard: DashboardConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RealtimeConfig {
    pub enabled: bool,
    /// Tables to subscribe to
    pub tables: Vec<Table>,
    pub reconnect_initial_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    /// Zero means keep trying
    pub max_reconnect_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PreferencesConfig {
    /// File holding the last active team id
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub default_sort_key: String,
    pub default_sort_order: String,
    /// Days added to today for a new task's promise date
    pub default_promise_offset_days: i64,
    pub default_date_range: DefaultDateRange,
}

/// Date range applied to the task filter when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultDateRange {
    #[default]
    CurrentMonth,
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub with_target: bool,
    /// One JSON object per line instead of human-readable output
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                request_timeout_seconds: 30,
            },
            realtime: RealtimeConfig {
                enabled: true,
                tables: vec![Table::Tasks, Table::TeamMembers, Table::Projects],
                reconnect_initial_delay_ms: 500,
                reconnect_max_delay_ms: 30_000,
                max_reconnect_attempts: 0,
            },
            preferences: PreferencesConfig {
                path: ".taskdesk/active_team".to_string(),
            },
            dashboard: DashboardConfig {
                default_sort_key: "promise_date".to_string(),
                default_sort_order: "asc".to_string(),
                default_promise_offset_days: 2,
                default_date_range: DefaultDateRange::CurrentMonth,
            },
            logging: LoggingConfig {
                filter: "info,td_dashboard=debug".to_string(),
                with_target: true,
                json: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from explicit environment variables
    pub fn from_env() -> TdResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TASKDESK_STORE_URL") {
            config.store.url = url;
        }
        if let Ok(key) = std::env::var("TASKDESK_STORE_ANON_KEY") {
            config.store.anon_key = key;
        }
        if let Ok(timeout) = std::env::var("TASKDESK_STORE_TIMEOUT_SECONDS") {
            config.store.request_timeout_seconds = timeout.parse().map_err(|_| {
                TdError::Config(format!("TASKDESK_STORE_TIMEOUT_SECONDS: not a number: {}", timeout))
            })?;
        }

        let parse_bool = |v: String| v == "true" || v == "1" || v == "yes";
        if let Ok(v) = std::env::var("TASKDESK_REALTIME_ENABLED") {
            config.realtime.enabled = parse_bool(v);
        }
        if let Ok(tables) = std::env::var("TASKDESK_REALTIME_TABLES") {
            config.realtime.tables = tables
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(Table::from_name)
                .collect::<TdResult<Vec<_>>>()?;
        }

        if let Ok(path) = std::env::var("TASKDESK_PREFERENCES_PATH") {
            config.preferences.path = path;
        }

        if let Ok(filter) = std::env::var("TASKDESK_LOG") {
            config.logging.filter = filter;
        }
        if let Ok(v) = std::env::var("TASKDESK_LOG_JSON") {
            config.logging.json = parse_bool(v);
        }

        Ok(config)
    }

    /// Layer `TASKDESK__SECTION__KEY` environment overrides over the defaults
    pub fn load() -> TdResult<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| TdError::Config(e.to_string()))?;

        config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::Environment::with_prefix("TASKDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|e| TdError::Config(e.to_string()))
    }

    pub fn validate(&self) -> TdResult<()> {
        if self.realtime.reconnect_initial_delay_ms == 0 {
            return Err(TdError::Config(
                "realtime.reconnect_initial_delay_ms must be positive".to_string(),
            ));
        }
        if self.realtime.reconnect_max_delay_ms < self.realtime.reconnect_initial_delay_ms {
            return Err(TdError::Config(
                "realtime.reconnect_max_delay_ms must not be below the initial delay".to_string(),
            ));
        }
        if self.preferences.path.trim().is_empty() {
            return Err(TdError::Config("preferences.path is empty".to_string()));
        }
        Ok(())
    }
}
