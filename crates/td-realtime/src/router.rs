//! Event routing
//!
//! One dispatch from table name to store collection. Tables the client does
//! not mirror are reported as errors rather than skipped.

use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::types::{ChangeKind, Table};
use td_store::{Applied, ChangeEvent, EntityStore, Record};

/// Apply one pushed change to the store
///
/// Deletes carry only the old row's key; inserts and updates the full new row.
pub fn route_event(store: &mut EntityStore, event: &ChangeEvent) -> TdResult<Applied> {
    let table = Table::from_name(&event.table)?;
    let kind = table
        .entity_kind()
        .ok_or_else(|| TdError::UnknownTable(event.table.clone()))?;
    let row = event.payload().ok_or_else(|| {
        TdError::Internal(format!(
            "{} event on {} without a row",
            event.event_kind.as_str(),
            event.table
        ))
    })?;

    let record = match event.event_kind {
        ChangeKind::Delete => Record::key_from_row(kind, row)?,
        ChangeKind::Insert | ChangeKind::Update => Record::from_row(kind, row.clone())?,
    };
    store.apply_change(kind, event.event_kind, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn task_row(id: i64, status: &str) -> Value {
        json!({
            "id": id,
            "department_id": 1,
            "description": "Ship report",
            "project": null,
            "owner": "Alice",
            "priority": "High",
            "status": status,
            "assigned_date": "2024-01-02",
            "promise_date": "2024-01-04",
            "completed_date": null,
            "comments": null
        })
    }

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store.reset(Some(1));
        store
    }

    #[test]
    fn test_insert_update_delete() {
        let mut store = store();

        let applied = route_event(&mut store, &ChangeEvent::insert(Table::Tasks, task_row(7, "Pending")));
        assert_eq!(applied, Ok(Applied::Inserted));

        let applied = route_event(
            &mut store,
            &ChangeEvent::update(Table::Tasks, None, task_row(7, "In Progress")),
        );
        assert_eq!(applied, Ok(Applied::Replaced));
        assert_eq!(store.tasks().len(), 1);

        let applied = route_event(&mut store, &ChangeEvent::delete(Table::Tasks, json!({"id": 7})));
        assert_eq!(applied, Ok(Applied::Removed));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_duplicate_delivery_is_unchanged() {
        let mut store = store();
        let event = ChangeEvent::insert(Table::Tasks, task_row(7, "Pending"));
        route_event(&mut store, &event).unwrap();
        assert_eq!(route_event(&mut store, &event), Ok(Applied::Unchanged));
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_out_of_order_delete_then_insert() {
        let mut store = store();
        route_event(&mut store, &ChangeEvent::delete(Table::Tasks, json!({"id": 7}))).unwrap();
        route_event(&mut store, &ChangeEvent::insert(Table::Tasks, task_row(7, "Pending"))).unwrap();
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, 7);
    }

    #[test]
    fn test_unrecognized_tables() {
        let mut store = store();

        let mut event = ChangeEvent::insert(Table::Tasks, task_row(7, "Pending"));
        event.table = "audit_log".to_string();
        assert_eq!(
            route_event(&mut store, &event),
            Err(TdError::UnknownTable("audit_log".to_string()))
        );

        let event = ChangeEvent::insert(
            Table::Departments,
            json!({"id": 1, "name": "Engineering", "access_code": "ENG-4821"}),
        );
        assert!(matches!(route_event(&mut store, &event), Err(TdError::UnknownTable(_))));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_malformed_row_leaves_store_unchanged() {
        let mut store = store();
        let event = ChangeEvent::insert(Table::Projects, json!({"id": 3}));
        assert!(matches!(route_event(&mut store, &event), Err(TdError::Internal(_))));
        assert!(store.projects().is_empty());
    }
}
