//! Entity store
//!
//! The single mutable mirror of the active team's rows. Every mutation, local
//! or pushed, goes through [`EntityStore::load`] or
//! [`EntityStore::apply_change`]; each successful mutation marks derived state
//! dirty, and the owner recomputes once per task boundary by calling
//! [`EntityStore::take_dirty`].
//!
//! Team rows (tasks, members, projects) are scoped to the active department.
//! Memberships belong to the signed-in user and span departments, so they
//! survive team switches and are only dropped on [`EntityStore::clear`].

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::sync::Arc;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::{Id, Identifiable};
use td_core::types::{ChangeKind, EntityKind};
use td_models::{reconcile_completed_date, DepartmentMembership, Project, Task, TeamMember};
use tracing::{debug, warn};

use crate::loader::TeamSnapshot;
use crate::record::Record;

/// Store handle shared by the dashboard, the services and the realtime channel
///
/// The lock is never held across an await point.
pub type SharedStore = Arc<RwLock<EntityStore>>;

/// Outcome of a single change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Removed,
    /// The store already matched; nothing to recompute
    Unchanged,
    /// Row of another department; dropped
    Ignored,
}

impl Applied {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced | Self::Removed)
    }
}

#[derive(Debug, Clone)]
struct Collection<T> {
    rows: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Identifiable + PartialEq> Collection<T> {
    fn replace_all(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }

    fn get(&self, id: Id) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    fn upsert(&mut self, row: T) -> Applied {
        match self.rows.iter().position(|existing| existing.id() == row.id()) {
            Some(pos) if self.rows[pos] == row => Applied::Unchanged,
            Some(pos) => {
                self.rows[pos] = row;
                Applied::Replaced
            }
            None => {
                self.rows.push(row);
                Applied::Inserted
            }
        }
    }

    fn remove(&mut self, id: Id) -> Applied {
        let before = self.rows.len();
        self.rows.retain(|row| row.id() != id);
        if self.rows.len() < before {
            Applied::Removed
        } else {
            Applied::Unchanged
        }
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    department_id: Option<Id>,
    tasks: Collection<Task>,
    members: Collection<TeamMember>,
    projects: Collection<Project>,
    memberships: Collection<DepartmentMembership>,
    /// Team-row changes applied since [`EntityStore::begin_load`], replayed
    /// over the snapshot by [`EntityStore::install`]
    pending: Option<Vec<(ChangeKind, Record)>>,
    generation: u64,
    dirty: bool,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Department the team rows are scoped to
    pub fn department_id(&self) -> Option<Id> {
        self.department_id
    }

    /// Drop all team rows and rescope to `department_id`
    pub fn reset(&mut self, department_id: Option<Id>) {
        debug!(?department_id, "resetting entity store");
        self.department_id = department_id;
        self.pending = None;
        self.tasks.clear();
        self.members.clear();
        self.projects.clear();
        self.invalidate();
    }

    /// Rescope to `department_id` ahead of a team load
    ///
    /// Changes applied until the matching [`EntityStore::install`] are kept
    /// and replayed over the loaded snapshot, so rows pushed while the load
    /// was in flight are not lost.
    pub fn begin_load(&mut self, department_id: Id) {
        self.reset(Some(department_id));
        self.pending = Some(Vec::new());
    }

    /// The load failed; keep the rows applied so far and stop holding changes
    pub fn cancel_load(&mut self) {
        self.pending = None;
    }

    /// Whether a team load is awaiting its snapshot
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop everything, memberships included
    pub fn clear(&mut self) {
        self.reset(None);
        self.memberships.clear();
    }

    /// Replace the whole collection for one kind
    ///
    /// Either every record is accepted or the collection is left untouched.
    pub fn load(&mut self, kind: EntityKind, records: Vec<Record>) -> TdResult<()> {
        if let Some(bad) = records.iter().find(|r| r.kind() != kind || r.is_key_only()) {
            return Err(TdError::Internal(format!(
                "cannot load {:?} into the {} collection",
                bad, kind
            )));
        }

        let count = records.len();
        match kind {
            EntityKind::Task => self.tasks.replace_all(
                records
                    .into_iter()
                    .filter_map(|r| match r {
                        Record::Task(task) => Some(task),
                        _ => None,
                    })
                    .collect(),
            ),
            EntityKind::TeamMember => self.members.replace_all(
                records
                    .into_iter()
                    .filter_map(|r| match r {
                        Record::TeamMember(member) => Some(member),
                        _ => None,
                    })
                    .collect(),
            ),
            EntityKind::Project => self.projects.replace_all(
                records
                    .into_iter()
                    .filter_map(|r| match r {
                        Record::Project(project) => Some(project),
                        _ => None,
                    })
                    .collect(),
            ),
            EntityKind::Membership => self.memberships.replace_all(
                records
                    .into_iter()
                    .filter_map(|r| match r {
                        Record::Membership(membership) => Some(membership),
                        _ => None,
                    })
                    .collect(),
            ),
        }

        debug!(%kind, count, "loaded collection");
        self.invalidate();
        Ok(())
    }

    /// Install a freshly loaded team in one step
    ///
    /// Rescopes the store to the snapshot's department and marks derived
    /// state dirty once.
    pub fn install(&mut self, snapshot: TeamSnapshot) {
        debug!(
            department_id = snapshot.department_id,
            tasks = snapshot.tasks.len(),
            members = snapshot.members.len(),
            projects = snapshot.projects.len(),
            "installing team snapshot"
        );
        let pending = match self.pending.take() {
            Some(pending) if self.department_id == Some(snapshot.department_id) => pending,
            _ => Vec::new(),
        };
        self.department_id = Some(snapshot.department_id);
        self.tasks.replace_all(snapshot.tasks);
        self.members.replace_all(snapshot.members);
        self.projects.replace_all(snapshot.projects);

        if !pending.is_empty() {
            debug!(count = pending.len(), "replaying changes received during load");
        }
        for (change, record) in pending {
            if let Err(err) = self.apply_change(record.kind(), change, record) {
                warn!(error = %err, "could not replay a change received during load");
            }
        }
        self.invalidate();
    }

    /// Idempotent upsert/remove keyed by id
    ///
    /// - insert of an existing id replaces it
    /// - update of a missing id inserts it
    /// - delete of a missing id is a no-op
    pub fn apply_change(
        &mut self,
        kind: EntityKind,
        change: ChangeKind,
        record: Record,
    ) -> TdResult<Applied> {
        if record.kind() != kind {
            return Err(TdError::Internal(format!(
                "{} record routed to the {} collection",
                record.kind(),
                kind
            )));
        }

        let id = record.id();
        let applied = match change {
            ChangeKind::Delete => {
                self.hold_for_replay(change, &record);
                match kind {
                    EntityKind::Task => self.tasks.remove(id),
                    EntityKind::TeamMember => self.members.remove(id),
                    EntityKind::Project => self.projects.remove(id),
                    EntityKind::Membership => self.memberships.remove(id),
                }
            }
            ChangeKind::Insert | ChangeKind::Update => {
                if let Some(owner) = record.department_id() {
                    if self.department_id != Some(owner) {
                        debug!(%kind, id, department_id = owner, "ignoring row outside the active team");
                        return Ok(Applied::Ignored);
                    }
                }
                self.hold_for_replay(change, &record);
                match record {
                    Record::Task(task) => {
                        if task.is_done() != task.completed_date.is_some() {
                            warn!(
                                id,
                                status = %task.status,
                                "task row disagrees with its completion date"
                            );
                        }
                        self.tasks.upsert(task)
                    }
                    Record::TeamMember(member) => self.members.upsert(member),
                    Record::Project(project) => self.projects.upsert(project),
                    Record::Membership(membership) => self.memberships.upsert(membership),
                    Record::Key(..) => {
                        return Err(TdError::Internal(format!(
                            "{} of {} {} needs a full record",
                            change.as_str(),
                            kind,
                            id
                        )));
                    }
                }
            }
        };

        debug!(%kind, change = change.as_str(), id, ?applied, "applied change");
        if applied.changed() {
            self.invalidate();
        }
        Ok(applied)
    }

    /// Apply a locally originated change
    ///
    /// Task writes have their completion date reconciled against the stored
    /// version first, so no local path can break that invariant.
    pub fn apply_local(
        &mut self,
        change: ChangeKind,
        record: Record,
        today: NaiveDate,
    ) -> TdResult<Applied> {
        let record = match record {
            Record::Task(task) if change != ChangeKind::Delete => {
                Record::Task(self.prepare_task(task, today))
            }
            other => other,
        };
        self.apply_change(record.kind(), change, record)
    }

    /// The task as it must be written, given the stored version
    pub fn prepare_task(&self, mut next: Task, today: NaiveDate) -> Task {
        let previous = self.tasks.get(next.id);
        reconcile_completed_date(previous, &mut next, today);
        next
    }

    /// Read-only copy of one collection
    pub fn snapshot(&self, kind: EntityKind) -> Vec<Record> {
        match kind {
            EntityKind::Task => self.tasks.rows.iter().cloned().map(Record::from).collect(),
            EntityKind::TeamMember => self.members.rows.iter().cloned().map(Record::from).collect(),
            EntityKind::Project => self.projects.rows.iter().cloned().map(Record::from).collect(),
            EntityKind::Membership => {
                self.memberships.rows.iter().cloned().map(Record::from).collect()
            }
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks.rows
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members.rows
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects.rows
    }

    pub fn memberships(&self) -> &[DepartmentMembership] {
        &self.memberships.rows
    }

    pub fn task(&self, id: Id) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn member(&self, id: Id) -> Option<&TeamMember> {
        self.members.get(id)
    }

    pub fn project(&self, id: Id) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Project with the given name, compared case-insensitively
    pub fn project_named(&self, name: &str) -> Option<&Project> {
        self.projects.rows.iter().find(|project| project.has_name(name))
    }

    /// Bumped on every mutation that changed the mirror
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag; true when a recompute is due
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn hold_for_replay(&mut self, change: ChangeKind, record: &Record) {
        if record.kind() == EntityKind::Membership {
            return;
        }
        if let Some(pending) = self.pending.as_mut() {
            pending.push((change, record.clone()));
        }
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_models::{Role, TaskStatus};
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(id: Id, description: &str, status: TaskStatus) -> Task {
        Task {
            id,
            department_id: 1,
            description: description.to_string(),
            project: None,
            owner: "Alice".to_string(),
            priority: None,
            status,
            assigned_date: date("2024-01-02"),
            promise_date: date("2024-01-09"),
            completed_date: None,
            comments: None,
        }
    }

    fn scoped_store() -> EntityStore {
        let mut store = EntityStore::new();
        store.reset(Some(1));
        store.take_dirty();
        store
    }

    #[test]
    fn test_duplicate_insert_is_idempotent() {
        let mut store = scoped_store();
        let record = Record::Task(task(1, "Ship report", TaskStatus::Pending));

        let first = store
            .apply_change(EntityKind::Task, ChangeKind::Insert, record.clone())
            .unwrap();
        let once = store.snapshot(EntityKind::Task);
        let second = store
            .apply_change(EntityKind::Task, ChangeKind::Insert, record)
            .unwrap();

        assert_eq!(first, Applied::Inserted);
        assert_eq!(second, Applied::Unchanged);
        assert_eq!(store.snapshot(EntityKind::Task), once);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_update_of_missing_row_inserts() {
        let mut store = scoped_store();
        let applied = store
            .apply_change(
                EntityKind::Task,
                ChangeKind::Update,
                Record::Task(task(5, "Ship report", TaskStatus::Pending)),
            )
            .unwrap();
        assert_eq!(applied, Applied::Inserted);
        assert!(store.task(5).is_some());
    }

    #[test]
    fn test_delete_then_insert_follows_arrival_order() {
        let mut store = scoped_store();
        let v1 = Record::Task(task(1, "first", TaskStatus::Pending));
        let v2 = Record::Task(task(1, "second", TaskStatus::InProgress));
        store.apply_change(EntityKind::Task, ChangeKind::Insert, v1).unwrap();

        store
            .apply_change(EntityKind::Task, ChangeKind::Delete, Record::Key(EntityKind::Task, 1))
            .unwrap();
        store.apply_change(EntityKind::Task, ChangeKind::Insert, v2.clone()).unwrap();
        assert_eq!(store.snapshot(EntityKind::Task), vec![v2.clone()]);

        store.apply_change(EntityKind::Task, ChangeKind::Insert, v2).unwrap();
        store
            .apply_change(EntityKind::Task, ChangeKind::Delete, Record::Key(EntityKind::Task, 1))
            .unwrap();
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_delete_of_absent_row_is_noop() {
        let mut store = scoped_store();
        let applied = store
            .apply_change(EntityKind::Project, ChangeKind::Delete, Record::Key(EntityKind::Project, 9))
            .unwrap();
        assert_eq!(applied, Applied::Unchanged);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_key_only_update_is_rejected() {
        let mut store = scoped_store();
        let result = store.apply_change(
            EntityKind::Task,
            ChangeKind::Update,
            Record::Key(EntityKind::Task, 1),
        );
        assert!(matches!(result, Err(TdError::Internal(_))));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut store = scoped_store();
        let result = store.apply_change(
            EntityKind::Project,
            ChangeKind::Insert,
            Record::Task(task(1, "Ship report", TaskStatus::Pending)),
        );
        assert!(result.is_err());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_rows_of_other_teams_are_ignored() {
        let mut store = scoped_store();
        let mut foreign = task(1, "Ship report", TaskStatus::Pending);
        foreign.department_id = 2;
        let applied = store
            .apply_change(EntityKind::Task, ChangeKind::Insert, Record::Task(foreign))
            .unwrap();
        assert_eq!(applied, Applied::Ignored);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_team_rows_are_ignored_without_active_team() {
        let mut store = scoped_store();
        store.clear();

        let mut foreign = task(1, "Ship report", TaskStatus::Pending);
        foreign.department_id = 99;
        let applied = store
            .apply_change(EntityKind::Task, ChangeKind::Insert, Record::Task(foreign))
            .unwrap();
        assert_eq!(applied, Applied::Ignored);
        assert!(store.tasks().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_changes_during_load_survive_install() {
        let mut store = scoped_store();
        store.begin_load(1);
        assert!(store.is_loading());

        store
            .apply_change(
                EntityKind::Task,
                ChangeKind::Insert,
                task(3, "Pushed", TaskStatus::Pending).into(),
            )
            .unwrap();
        store
            .apply_change(EntityKind::Task, ChangeKind::Delete, Record::Key(EntityKind::Task, 2))
            .unwrap();

        store.install(TeamSnapshot {
            department_id: 1,
            tasks: vec![
                task(1, "Existing", TaskStatus::Pending),
                task(2, "Deleted remotely", TaskStatus::Pending),
            ],
            members: Vec::new(),
            projects: Vec::new(),
        });

        let ids: Vec<Id> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_reset_drops_changes_held_for_an_abandoned_load() {
        let mut store = scoped_store();
        store.begin_load(1);
        store
            .apply_change(
                EntityKind::Task,
                ChangeKind::Insert,
                task(3, "Pushed", TaskStatus::Pending).into(),
            )
            .unwrap();

        store.begin_load(2);
        store.install(TeamSnapshot {
            department_id: 2,
            ..TeamSnapshot::default()
        });
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_completed_date_invariant_on_local_writes() {
        let mut store = scoped_store();
        let today = date("2024-01-05");
        store
            .apply_local(ChangeKind::Insert, task(1, "Ship report", TaskStatus::Pending).into(), today)
            .unwrap();

        store
            .apply_local(ChangeKind::Update, task(1, "Ship report", TaskStatus::Done).into(), today)
            .unwrap();
        assert_eq!(store.task(1).unwrap().completed_date, Some(today));

        let later = date("2024-01-07");
        store
            .apply_local(ChangeKind::Update, task(1, "Ship report v2", TaskStatus::Done).into(), later)
            .unwrap();
        assert_eq!(store.task(1).unwrap().completed_date, Some(today));

        store
            .apply_local(ChangeKind::Update, task(1, "Ship report v2", TaskStatus::Pending).into(), later)
            .unwrap();
        assert_eq!(store.task(1).unwrap().completed_date, None);
    }

    #[test]
    fn test_bulk_load_marks_dirty_once() {
        let mut store = scoped_store();
        store
            .load(EntityKind::Task, vec![task(1, "a", TaskStatus::Pending).into()])
            .unwrap();
        store.load(EntityKind::TeamMember, vec![]).unwrap();
        store.load(EntityKind::Project, vec![]).unwrap();

        assert!(store.take_dirty());
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_load_rejects_mixed_kinds_without_partial_apply() {
        let mut store = scoped_store();
        store
            .load(EntityKind::Task, vec![task(1, "a", TaskStatus::Pending).into()])
            .unwrap();
        let result = store.load(
            EntityKind::Task,
            vec![
                task(2, "b", TaskStatus::Pending).into(),
                Record::Key(EntityKind::Task, 3),
            ],
        );
        assert!(result.is_err());
        assert_eq!(store.tasks()[0].id, 1);
    }

    #[test]
    fn test_reset_keeps_memberships() {
        let mut store = scoped_store();
        let membership = DepartmentMembership {
            id: 1,
            user_id: Uuid::new_v4(),
            department_id: 1,
            role: Role::Admin,
            department_name: None,
        };
        store
            .apply_change(EntityKind::Membership, ChangeKind::Insert, membership.into())
            .unwrap();
        store
            .apply_change(EntityKind::Task, ChangeKind::Insert, task(1, "a", TaskStatus::Pending).into())
            .unwrap();

        store.reset(Some(2));
        assert!(store.tasks().is_empty());
        assert_eq!(store.memberships().len(), 1);

        store.clear();
        assert!(store.memberships().is_empty());
        assert_eq!(store.department_id(), None);
    }
}
