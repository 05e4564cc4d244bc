//! Team snapshot loading
//!
//! A team is loaded as three department-filtered selects issued together.
//! The snapshot is only installed by the caller, after it has checked that
//! the team is still the one being switched to.

use serde_json::Value;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::Id;
use td_core::types::Table;
use td_models::{Department, DepartmentMembership, Project, Task, TeamMember};
use tracing::debug;
use uuid::Uuid;

use crate::gateway::{RowFilter, TableGateway};

/// All team-scoped rows of one department
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TeamSnapshot {
    pub department_id: Id,
    pub tasks: Vec<Task>,
    pub members: Vec<TeamMember>,
    pub projects: Vec<Project>,
}

fn decode<T: serde::de::DeserializeOwned>(table: Table, rows: Vec<Value>) -> TdResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| TdError::Internal(format!("malformed {} row: {}", table, e)))
        })
        .collect()
}

pub async fn load_team_snapshot(
    gateway: &dyn TableGateway,
    department_id: Id,
) -> TdResult<TeamSnapshot> {
    let filter = RowFilter::department(department_id);
    let (tasks, members, projects) = tokio::try_join!(
        gateway.select_all(Table::Tasks, &filter),
        gateway.select_all(Table::TeamMembers, &filter),
        gateway.select_all(Table::Projects, &filter),
    )?;

    let snapshot = TeamSnapshot {
        department_id,
        tasks: decode(Table::Tasks, tasks)?,
        members: decode(Table::TeamMembers, members)?,
        projects: decode(Table::Projects, projects)?,
    };
    debug!(
        department_id,
        tasks = snapshot.tasks.len(),
        members = snapshot.members.len(),
        projects = snapshot.projects.len(),
        "loaded team snapshot"
    );
    Ok(snapshot)
}

/// Memberships of a user, with team names filled in
pub async fn load_memberships(
    gateway: &dyn TableGateway,
    user_id: Uuid,
) -> TdResult<Vec<DepartmentMembership>> {
    let rows = gateway
        .select_all(
            Table::DepartmentMemberships,
            &RowFilter::all().eq("user_id", user_id.to_string()),
        )
        .await?;
    let mut memberships: Vec<DepartmentMembership> = decode(Table::DepartmentMemberships, rows)?;

    for membership in &mut memberships {
        if membership.department_name.is_some() {
            continue;
        }
        let departments: Vec<Department> = decode(
            Table::Departments,
            gateway
                .select_all(
                    Table::Departments,
                    &RowFilter::all().eq("id", membership.department_id),
                )
                .await?,
        )?;
        membership.department_name = departments.into_iter().next().map(|d| d.name);
    }

    Ok(memberships)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use serde_json::json;

    #[tokio::test]
    async fn test_snapshot_is_scoped_to_department() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            Table::Projects,
            vec![
                json!({"id": 1, "department_id": 1, "name": "Website"}),
                json!({"id": 2, "department_id": 2, "name": "Backend"}),
            ],
        );
        gateway.seed(
            Table::TeamMembers,
            vec![json!({"id": 1, "department_id": 2, "name": "Bob", "designation": "QA"})],
        );

        let snapshot = load_team_snapshot(&gateway, 2).await.unwrap();
        assert_eq!(snapshot.department_id, 2);
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.projects[0].name, "Backend");
        assert_eq!(snapshot.members[0].name, "Bob");
        assert!(snapshot.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_fails_as_a_whole() {
        let gateway = MemoryGateway::new();
        gateway.fail(Table::TeamMembers, "permission denied for table team_members");
        let result = load_team_snapshot(&gateway, 1).await;
        assert!(matches!(result, Err(TdError::Store { .. })));
    }

    #[tokio::test]
    async fn test_memberships_carry_team_names() {
        let gateway = MemoryGateway::new();
        let user = Uuid::new_v4();
        gateway.seed(
            Table::Departments,
            vec![json!({"id": 5, "name": "Engineering", "access_code": "ENG-1234"})],
        );
        gateway.seed(
            Table::DepartmentMemberships,
            vec![
                json!({"id": 1, "user_id": user.to_string(), "department_id": 5, "role": "Admin"}),
                json!({"id": 2, "user_id": Uuid::new_v4().to_string(), "department_id": 5, "role": "Member"}),
            ],
        );

        let memberships = load_memberships(&gateway, user).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].department_name.as_deref(), Some("Engineering"));
    }
}
