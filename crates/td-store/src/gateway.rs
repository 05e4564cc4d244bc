//! Persistence collaborator
//!
//! The remote relational store is reached through [`TableGateway`]. Rows
//! travel as JSON objects; typed decoding happens at the store boundary in
//! [`crate::record`].

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::Id;
use td_core::types::Table;
use tokio::sync::broadcast;
use tracing::debug;

use crate::change::ChangeEvent;

/// Equality conditions on columns, combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    conditions: Vec<(String, Value)>,
}

impl RowFilter {
    /// Matches every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows owned by one team
    pub fn department(department_id: Id) -> Self {
        Self::all().eq("department_id", department_id)
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

/// Table access in the remote store
///
/// Every call is one round trip. Errors are collaborator errors: the caller
/// must leave local state untouched when one is returned.
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// Rows matching the filter
    async fn select_all(&self, table: Table, filter: &RowFilter) -> TdResult<Vec<Value>>;

    /// Insert rows; returns them as stored, ids assigned
    async fn insert(&self, table: Table, rows: Vec<Value>) -> TdResult<Vec<Value>>;

    /// Merge `patch` into the row with the given id
    async fn update(&self, table: Table, id: Id, patch: Value) -> TdResult<()>;

    async fn delete(&self, table: Table, id: Id) -> TdResult<()>;
}

/// In-memory store for development and tests
///
/// Emits a [`ChangeEvent`] for every write, standing in for the remote
/// change feed. Deletes carry only the primary key of the old row.
pub struct MemoryGateway {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    unique: Vec<(Table, &'static str)>,
    failures: Mutex<HashMap<Table, String>>,
    next_id: AtomicI64,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            tables: RwLock::new(HashMap::new()),
            unique: vec![(Table::Departments, "access_code")],
            failures: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            changes,
        }
    }

    /// Receive every write made from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Put rows in place without emitting change events
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut tables = self.tables.write();
        let stored = tables.entry(table).or_default();
        for mut row in rows {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
            } else if let Some(object) = row.as_object_mut() {
                object.insert("id".to_string(), Value::from(self.allocate_id()));
            }
            stored.push(row);
        }
    }

    /// Make every call touching `table` fail until [`MemoryGateway::recover`]
    pub fn fail(&self, table: Table, message: impl Into<String>) {
        self.failures.lock().insert(table, message.into());
    }

    pub fn recover(&self, table: Table) {
        self.failures.lock().remove(&table);
    }

    /// Current rows of a table, for assertions
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.read().get(&table).cloned().unwrap_or_default()
    }

    fn allocate_id(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_failure(&self, table: Table) -> TdResult<()> {
        match self.failures.lock().get(&table) {
            Some(message) => Err(TdError::store(table.as_str(), message.clone())),
            None => Ok(()),
        }
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine.
        let _ = self.changes.send(event);
    }
}

fn as_object(table: Table, row: Value) -> TdResult<Map<String, Value>> {
    match row {
        Value::Object(object) => Ok(object),
        other => Err(TdError::store(
            table.as_str(),
            format!("expected a row object, got {}", other),
        )),
    }
}

#[async_trait]
impl TableGateway for MemoryGateway {
    async fn select_all(&self, table: Table, filter: &RowFilter) -> TdResult<Vec<Value>> {
        self.check_failure(table)?;
        let tables = self.tables.read();
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> TdResult<Vec<Value>> {
        self.check_failure(table)?;
        let mut objects = rows
            .into_iter()
            .map(|row| as_object(table, row))
            .collect::<TdResult<Vec<_>>>()?;

        let inserted = {
            let mut tables = self.tables.write();
            let stored = tables.entry(table).or_default();

            for (unique_table, column) in &self.unique {
                if *unique_table != table {
                    continue;
                }
                for (i, object) in objects.iter().enumerate() {
                    let Some(value) = object.get(*column) else {
                        continue;
                    };
                    let clashes_stored = stored.iter().any(|row| row.get(*column) == Some(value));
                    let clashes_batch = objects[..i].iter().any(|o| o.get(*column) == Some(value));
                    if clashes_stored || clashes_batch {
                        return Err(TdError::store(
                            table.as_str(),
                            format!(
                                "duplicate key value violates unique constraint \"{}_{}_key\"",
                                table, column
                            ),
                        ));
                    }
                }
            }

            for object in &mut objects {
                object.insert("id".to_string(), Value::from(self.allocate_id()));
            }
            let inserted: Vec<Value> = objects.into_iter().map(Value::Object).collect();
            stored.extend(inserted.iter().cloned());
            inserted
        };

        debug!(%table, count = inserted.len(), "inserted rows");
        for row in &inserted {
            self.publish(ChangeEvent::insert(table, row.clone()));
        }
        Ok(inserted)
    }

    async fn update(&self, table: Table, id: Id, patch: Value) -> TdResult<()> {
        self.check_failure(table)?;
        let patch = as_object(table, patch)?;

        let (old, new) = {
            let mut tables = self.tables.write();
            let row = tables
                .get_mut(&table)
                .and_then(|rows| {
                    rows.iter_mut()
                        .find(|row| row.get("id").and_then(Value::as_i64) == Some(id))
                })
                .ok_or_else(|| TdError::NotFound {
                    entity: table.as_str(),
                    field: "id",
                    value: id.to_string(),
                })?;

            let old = row.clone();
            if let Some(object) = row.as_object_mut() {
                for (column, value) in patch {
                    if column != "id" {
                        object.insert(column, value);
                    }
                }
            }
            (old, row.clone())
        };

        debug!(%table, id, "updated row");
        self.publish(ChangeEvent::update(table, Some(old), new));
        Ok(())
    }

    async fn delete(&self, table: Table, id: Id) -> TdResult<()> {
        self.check_failure(table)?;
        let removed = {
            let mut tables = self.tables.write();
            match tables.get_mut(&table) {
                Some(rows) => {
                    let before = rows.len();
                    rows.retain(|row| row.get("id").and_then(Value::as_i64) != Some(id));
                    rows.len() < before
                }
                None => false,
            }
        };

        if removed {
            debug!(%table, id, "deleted row");
            self.publish(ChangeEvent::delete(table, serde_json::json!({ "id": id })));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use td_core::types::ChangeKind;

    #[tokio::test]
    async fn test_insert_assigns_ids_and_publishes() {
        let gateway = MemoryGateway::new();
        let mut feed = gateway.subscribe();

        let rows = gateway
            .insert(
                Table::Projects,
                vec![json!({"department_id": 1, "name": "Website"})],
            )
            .await
            .unwrap();

        assert!(rows[0]["id"].as_i64().is_some());
        let event = feed.recv().await.unwrap();
        assert_eq!(event.event_kind, ChangeKind::Insert);
        assert_eq!(event.table, "projects");
    }

    #[tokio::test]
    async fn test_select_with_filter() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            Table::Projects,
            vec![
                json!({"id": 1, "department_id": 1, "name": "Website"}),
                json!({"id": 2, "department_id": 2, "name": "Backend"}),
            ],
        );
        let rows = gateway
            .select_all(Table::Projects, &RowFilter::department(2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Backend");
    }

    #[tokio::test]
    async fn test_duplicate_access_code_is_rejected() {
        let gateway = MemoryGateway::new();
        let row = json!({"name": "Engineering", "access_code": "ENG-1234"});
        gateway.insert(Table::Departments, vec![row.clone()]).await.unwrap();

        let err = gateway.insert(Table::Departments, vec![row]).await.unwrap_err();
        assert!(matches!(err, TdError::Store { .. }));
        assert_eq!(gateway.rows(Table::Departments).len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let gateway = MemoryGateway::new();
        gateway.seed(Table::Projects, vec![json!({"id": 7, "department_id": 1, "name": "Web"})]);
        gateway
            .update(Table::Projects, 7, json!({"name": "Website"}))
            .await
            .unwrap();
        assert_eq!(gateway.rows(Table::Projects)[0]["name"], "Website");

        let missing = gateway.update(Table::Projects, 8, json!({"name": "x"})).await;
        assert!(matches!(missing, Err(TdError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_publishes_key_only_old_row() {
        let gateway = MemoryGateway::new();
        gateway.seed(Table::Tasks, vec![json!({"id": 3, "department_id": 1})]);
        let mut feed = gateway.subscribe();

        gateway.delete(Table::Tasks, 3).await.unwrap();
        gateway.delete(Table::Tasks, 3).await.unwrap();

        let event = feed.recv().await.unwrap();
        assert_eq!(event.old_record, Some(json!({"id": 3})));
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let gateway = MemoryGateway::new();
        gateway.fail(Table::DepartmentMemberships, "connection refused");
        let result = gateway
            .select_all(Table::DepartmentMemberships, &RowFilter::all())
            .await;
        assert!(matches!(result, Err(TdError::Store { .. })));

        gateway.recover(Table::DepartmentMemberships);
        assert!(gateway
            .select_all(Table::DepartmentMemberships, &RowFilter::all())
            .await
            .is_ok());
    }
}
