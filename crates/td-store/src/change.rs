//! Row-level change events
//!
//! The shape the push feed delivers: table name, event kind, and the row
//! before and after the change. The table is kept as the raw name so that
//! events for tables the client does not know can still be reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use td_core::types::{ChangeKind, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,

    #[serde(rename = "eventType")]
    pub event_kind: ChangeKind,

    #[serde(rename = "new", default, skip_serializing_if = "Option::is_none")]
    pub new_record: Option<Value>,

    #[serde(rename = "old", default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(table: Table, row: Value) -> Self {
        Self {
            table: table.as_str().to_string(),
            event_kind: ChangeKind::Insert,
            new_record: Some(row),
            old_record: None,
        }
    }

    pub fn update(table: Table, old: Option<Value>, row: Value) -> Self {
        Self {
            table: table.as_str().to_string(),
            event_kind: ChangeKind::Update,
            new_record: Some(row),
            old_record: old,
        }
    }

    pub fn delete(table: Table, old: Value) -> Self {
        Self {
            table: table.as_str().to_string(),
            event_kind: ChangeKind::Delete,
            new_record: None,
            old_record: Some(old),
        }
    }

    /// The row the change applies: the old row for deletes, the new one otherwise
    pub fn payload(&self) -> Option<&Value> {
        match self.event_kind {
            ChangeKind::Delete => self.old_record.as_ref(),
            ChangeKind::Insert | ChangeKind::Update => self.new_record.as_ref(),
        }
    }
}
