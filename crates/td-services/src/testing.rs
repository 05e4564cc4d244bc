//! Shared fixtures for service tests

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use td_core::result::TdResult;
use td_core::traits::{Clock, FixedClock, Id};
use td_core::types::Table;
use td_store::{EntityStore, MemoryGateway, RowFilter, SharedStore, TableGateway};

mock! {
    pub Gateway {}

    #[async_trait]
    impl TableGateway for Gateway {
        async fn select_all(&self, table: Table, filter: &RowFilter) -> TdResult<Vec<Value>>;
        async fn insert(&self, table: Table, rows: Vec<Value>) -> TdResult<Vec<Value>>;
        async fn update(&self, table: Table, id: Id, patch: Value) -> TdResult<()>;
        async fn delete(&self, table: Table, id: Id) -> TdResult<()>;
    }
}

pub fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::ymd(2024, 1, 5))
}

/// Store scoped to department 1
pub fn store() -> SharedStore {
    let store = EntityStore::shared();
    store.write().reset(Some(1));
    store
}

pub fn memory_gateway() -> Arc<MemoryGateway> {
    Arc::new(MemoryGateway::new())
}
