//! Team creation and joining
//!
//! Creating a team writes three rows: the department, the creator's admin
//! membership and a team member entry for the creator. The department row is
//! removed again when the membership cannot be written, so a failed sign-up
//! never leaves an orphaned team behind.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use td_core::error::{TdError, ValidationErrors};
use td_core::result::TdResult;
use td_core::types::{ChangeKind, EntityKind, Table};
use td_models::department::normalize_access_code;
use td_models::{
    Department, DepartmentMembership, NewDepartment, NewMembership, NewTeamMember, Role,
    TeamMember, User,
};
use td_store::{Record, RowFilter, SharedStore, TableGateway};
use tracing::{info, warn};

use crate::contracts::collect_field_errors;
use crate::result::ServiceResult;
use crate::support::{decode_one, decode_rows, encode_row};

pub const INVALID_TEAM_CODE: &str = "Invalid Team Code. Please ask your manager.";

/// Join code for a new team: the first three letters of its name, upper-cased,
/// and a four digit number, e.g. `ENG-4821`
pub fn generate_access_code(team_name: &str) -> String {
    generate_access_code_with(team_name, &mut rand::rng())
}

pub fn generate_access_code_with<R: Rng + ?Sized>(team_name: &str, rng: &mut R) -> String {
    let prefix: String = team_name.trim().chars().take(3).collect();
    format!("{}-{}", prefix.to_uppercase(), rng.random_range(1000..=9999))
}

/// Rows written for a user entering a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedTeam {
    pub department: Department,
    pub membership: DepartmentMembership,
    /// Absent when the roster entry could not be written
    pub member: Option<TeamMember>,
}

#[derive(Clone)]
pub struct TeamService {
    gateway: Arc<dyn TableGateway>,
    store: SharedStore,
}

impl TeamService {
    pub fn new(gateway: Arc<dyn TableGateway>, store: SharedStore) -> Self {
        Self { gateway, store }
    }

    /// Create a team with a generated access code and make `user` its admin
    pub async fn create_team(
        &self,
        user: &User,
        full_name: &str,
        team_name: &str,
    ) -> ServiceResult<JoinedTeam> {
        let code = generate_access_code(team_name);
        self.create_team_with_code(user, full_name, team_name, &code)
            .await
    }

    pub async fn create_team_with_code(
        &self,
        user: &User,
        full_name: &str,
        team_name: &str,
        access_code: &str,
    ) -> ServiceResult<JoinedTeam> {
        self.try_create(user, full_name, team_name, access_code)
            .await
            .into()
    }

    /// Join the team whose access code matches `code`, ignoring case
    pub async fn join_team(
        &self,
        user: &User,
        full_name: &str,
        code: &str,
    ) -> ServiceResult<JoinedTeam> {
        self.try_join(user, full_name, code).await.into()
    }

    async fn try_create(
        &self,
        user: &User,
        full_name: &str,
        team_name: &str,
        access_code: &str,
    ) -> TdResult<JoinedTeam> {
        let draft = NewDepartment {
            name: team_name.trim().to_string(),
            access_code: normalize_access_code(access_code),
        };
        let mut errors = ValidationErrors::new();
        collect_field_errors(&draft, &mut errors);
        errors.into_result()?;

        let inserted = self
            .gateway
            .insert(Table::Departments, vec![encode_row(&draft)?])
            .await?;
        let department: Department = decode_one(Table::Departments, inserted)?;

        let membership = match self
            .insert_membership(NewMembership::admin(user.id, department.id), &department)
            .await
        {
            Ok(membership) => membership,
            Err(err) => {
                if let Err(cleanup) = self.gateway.delete(Table::Departments, department.id).await {
                    warn!(department_id = department.id, error = %cleanup, "could not remove orphaned team");
                }
                return Err(err);
            }
        };

        let member = self.insert_member(user, full_name, &department, Role::Admin).await;
        info!(department_id = department.id, access_code = %department.access_code, "created team");
        Ok(self.finish(department, membership, member))
    }

    async fn try_join(&self, user: &User, full_name: &str, code: &str) -> TdResult<JoinedTeam> {
        let code = normalize_access_code(code);
        if code.is_empty() {
            return Err(TdError::invalid("Team Code is required."));
        }

        let rows = self
            .gateway
            .select_all(Table::Departments, &RowFilter::all().eq("access_code", code))
            .await?;
        let department = decode_rows::<Department>(Table::Departments, rows)?
            .into_iter()
            .next()
            .ok_or_else(|| TdError::invalid(INVALID_TEAM_CODE))?;

        let existing = self
            .store
            .read()
            .memberships()
            .iter()
            .find(|m| m.user_id == user.id && m.department_id == department.id)
            .cloned();
        if let Some(membership) = existing {
            info!(department_id = department.id, "already a member of team");
            return Ok(JoinedTeam {
                department,
                membership,
                member: None,
            });
        }

        let membership = self
            .insert_membership(NewMembership::member(user.id, department.id), &department)
            .await?;
        let member = self.insert_member(user, full_name, &department, Role::Member).await;
        info!(department_id = department.id, "joined team");
        Ok(self.finish(department, membership, member))
    }

    async fn insert_membership(
        &self,
        draft: NewMembership,
        department: &Department,
    ) -> TdResult<DepartmentMembership> {
        let inserted = self
            .gateway
            .insert(Table::DepartmentMemberships, vec![encode_row(&draft)?])
            .await?;
        let mut membership: DepartmentMembership =
            decode_one(Table::DepartmentMemberships, inserted)?;
        membership.department_name = Some(department.name.clone());
        Ok(membership)
    }

    /// Roster entry for the user; a failure is logged and the join still stands
    async fn insert_member(
        &self,
        user: &User,
        full_name: &str,
        department: &Department,
        role: Role,
    ) -> Option<TeamMember> {
        let draft = NewTeamMember::new(department.id, full_name, role.as_str()).with_user(user.id);
        let result: TdResult<TeamMember> = async {
            let row = encode_row(&draft)?;
            let inserted = self.gateway.insert(Table::TeamMembers, vec![row]).await?;
            decode_one::<TeamMember>(Table::TeamMembers, inserted)
        }
        .await;

        match result {
            Ok(member) => Some(member),
            Err(err) => {
                warn!(department_id = department.id, error = %err, "could not add roster entry");
                None
            }
        }
    }

    fn finish(
        &self,
        department: Department,
        membership: DepartmentMembership,
        member: Option<TeamMember>,
    ) -> JoinedTeam {
        let mut store = self.store.write();
        if let Err(err) = store.apply_change(
            EntityKind::Membership,
            ChangeKind::Insert,
            Record::Membership(membership.clone()),
        ) {
            warn!(error = %err, "could not mirror new membership");
        }
        if let Some(member) = &member {
            if store.department_id() == Some(department.id) {
                let _ = store.apply_change(
                    EntityKind::TeamMember,
                    ChangeKind::Insert,
                    Record::TeamMember(member.clone()),
                );
            }
        }
        JoinedTeam {
            department,
            membership,
            member,
        }
    }
}
