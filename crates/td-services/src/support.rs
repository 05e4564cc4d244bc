//! Row encoding shared by the services

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::Id;
use td_core::types::Table;
use td_store::SharedStore;

/// Department of the active team, or a consistency error when none is active
pub(crate) fn active_department(store: &SharedStore) -> TdResult<Id> {
    store
        .read()
        .department_id()
        .ok_or_else(|| TdError::Consistency("no active team".to_string()))
}

pub(crate) fn encode_row<T: Serialize>(row: &T) -> TdResult<Value> {
    serde_json::to_value(row).map_err(|e| TdError::Internal(e.to_string()))
}

pub(crate) fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> TdResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| TdError::Internal(format!("malformed {} row: {}", table, e)))
        })
        .collect()
}

/// The single row an insert of one row returned
pub(crate) fn decode_one<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> TdResult<T> {
    decode_rows(table, rows)?
        .into_iter()
        .next()
        .ok_or_else(|| TdError::store(table.as_str(), "insert returned no row"))
}
