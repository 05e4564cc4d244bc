//! Task services
//!
//! Creating a task for several owners fans out into one row per owner, all
//! sharing the same field values and assignment date. Edits run through the
//! entity store's completion-date reconciliation before they are submitted,
//! so the row written remotely is the row mirrored locally.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use td_core::error::{TdError, ValidationErrors};
use td_core::result::TdResult;
use td_core::traits::{Clock, Id};
use td_core::types::{ChangeKind, EntityKind, Table};
use td_models::{NewTask, Priority, Task, TaskStatus};
use td_store::{Record, SharedStore, TableGateway};
use tracing::{debug, info};

use crate::contracts::{Contract, TaskContract};
use crate::result::ServiceResult;
use crate::support::{active_department, decode_rows, encode_row};

/// Input of the new-task form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub description: String,
    pub project: Option<String>,
    /// One row is created per owner
    pub owners: Vec<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Defaults to today plus the configured offset
    pub promise_date: Option<NaiveDate>,
    pub comments: Option<String>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            project: None,
            owners: Vec::new(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            promise_date: None,
            comments: None,
        }
    }
}

impl TaskDraft {
    pub fn new<I, S>(description: impl Into<String>, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: description.into(),
            owners: owners.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Changes from the edit form; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub project: Option<Option<String>>,
    pub owner: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub promise_date: Option<NaiveDate>,
    pub comments: Option<Option<String>>,
}

impl TaskEdit {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// The stored task with these changes applied
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut next = task.clone();
        if let Some(description) = &self.description {
            next.description = description.trim().to_string();
        }
        if let Some(project) = &self.project {
            next.project = blank_to_none(project.as_deref());
        }
        if let Some(owner) = &self.owner {
            next.owner = owner.trim().to_string();
        }
        if let Some(priority) = self.priority {
            next.priority = Some(priority);
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(promise_date) = self.promise_date {
            next.promise_date = promise_date;
        }
        if let Some(comments) = &self.comments {
            next.comments = blank_to_none(comments.as_deref());
        }
        next
    }
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct TaskService {
    gateway: Arc<dyn TableGateway>,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    promise_offset_days: i64,
}

impl TaskService {
    pub fn new(gateway: Arc<dyn TableGateway>, store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            store,
            clock,
            promise_offset_days: 2,
        }
    }

    pub fn with_promise_offset(mut self, days: i64) -> Self {
        self.promise_offset_days = days;
        self
    }

    /// Default promise date for a task created today
    pub fn default_promise_date(&self) -> NaiveDate {
        self.clock.today() + Duration::days(self.promise_offset_days)
    }

    /// Pre-filled form for a new task
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            promise_date: Some(self.default_promise_date()),
            ..TaskDraft::default()
        }
    }

    pub async fn create(&self, draft: TaskDraft) -> ServiceResult<Vec<Task>> {
        self.try_create(draft).await.into()
    }

    pub async fn update(&self, id: Id, edit: TaskEdit) -> ServiceResult<Task> {
        self.try_update(id, edit).await.into()
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        self.try_delete(id).await.into()
    }

    async fn try_create(&self, draft: TaskDraft) -> TdResult<Vec<Task>> {
        let department_id = active_department(&self.store)?;
        let today = self.clock.today();
        let rows = self.build_rows(department_id, draft, today)?;

        let payload = rows.iter().map(encode_row).collect::<TdResult<Vec<_>>>()?;
        let inserted = self.gateway.insert(Table::Tasks, payload).await?;
        let tasks: Vec<Task> = decode_rows(Table::Tasks, inserted)?;

        let mut store = self.store.write();
        for task in &tasks {
            store.apply_local(ChangeKind::Insert, Record::Task(task.clone()), today)?;
        }
        info!(department_id, count = tasks.len(), "created tasks");
        Ok(tasks)
    }

    fn build_rows(
        &self,
        department_id: Id,
        draft: TaskDraft,
        today: NaiveDate,
    ) -> TdResult<Vec<NewTask>> {
        let mut owners: Vec<String> = Vec::new();
        for owner in draft.owners.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            if !owners.iter().any(|existing| existing == owner) {
                owners.push(owner.to_string());
            }
        }
        if owners.is_empty() {
            let mut errors = ValidationErrors::new();
            if draft.description.trim().is_empty() {
                errors.add("description", "can't be blank");
            }
            errors.add("owner", "must be selected");
            return Err(TdError::Validation(errors));
        }

        let promise_date = draft
            .promise_date
            .unwrap_or_else(|| today + Duration::days(self.promise_offset_days));

        let rows: Vec<NewTask> = owners
            .into_iter()
            .map(|owner| {
                let mut row = NewTask {
                    department_id,
                    description: draft.description.trim().to_string(),
                    project: blank_to_none(draft.project.as_deref()),
                    owner,
                    priority: draft.priority,
                    status: draft.status,
                    assigned_date: today,
                    promise_date,
                    completed_date: None,
                    comments: blank_to_none(draft.comments.as_deref()),
                };
                row.reconcile_completed_date();
                row
            })
            .collect();

        for row in &rows {
            TaskContract.validate(row)?;
        }
        Ok(rows)
    }

    async fn try_update(&self, id: Id, edit: TaskEdit) -> TdResult<Task> {
        let today = self.clock.today();
        let next = {
            let store = self.store.read();
            let current = store.task(id).ok_or_else(|| TdError::NotFound {
                entity: "Task",
                field: "id",
                value: id.to_string(),
            })?;
            store.prepare_task(edit.apply_to(current), today)
        };

        let mut errors = ValidationErrors::new();
        if next.description.is_empty() {
            errors.add("description", "can't be blank");
        }
        if next.owner.is_empty() {
            errors.add("owner", "must be selected");
        }
        errors.into_result()?;

        self.gateway.update(Table::Tasks, id, task_patch(&next)?).await?;
        self.store
            .write()
            .apply_local(ChangeKind::Update, Record::Task(next.clone()), today)?;
        debug!(id, status = %next.status, "updated task");
        Ok(next)
    }

    async fn try_delete(&self, id: Id) -> TdResult<()> {
        self.gateway.delete(Table::Tasks, id).await?;
        self.store
            .write()
            .apply_change(EntityKind::Task, ChangeKind::Delete, Record::Key(EntityKind::Task, id))?;
        debug!(id, "deleted task");
        Ok(())
    }
}

/// Update payload: every column except the keys
fn task_patch(task: &Task) -> TdResult<Value> {
    let mut patch = encode_row(task)?;
    if let Some(object) = patch.as_object_mut() {
        object.remove("id");
        object.remove("department_id");
    }
    Ok(patch)
}
