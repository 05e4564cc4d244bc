//! Team member services

use std::sync::Arc;
use td_core::result::TdResult;
use td_core::traits::{Clock, Id};
use td_core::types::{ChangeKind, EntityKind, Table};
use td_models::{NewTeamMember, TeamMember};
use td_store::{Record, SharedStore, TableGateway};
use tracing::info;

use crate::contracts::{Contract, MemberContract};
use crate::result::ServiceResult;
use crate::support::{active_department, decode_one, encode_row};

#[derive(Clone)]
pub struct MemberService {
    gateway: Arc<dyn TableGateway>,
    store: SharedStore,
    clock: Arc<dyn Clock>,
}

impl MemberService {
    pub fn new(gateway: Arc<dyn TableGateway>, store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            store,
            clock,
        }
    }

    /// Add a member to the active team; both fields are required
    pub async fn add(&self, name: &str, designation: &str) -> ServiceResult<TeamMember> {
        self.try_add(name, designation).await.into()
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        self.try_delete(id).await.into()
    }

    async fn try_add(&self, name: &str, designation: &str) -> TdResult<TeamMember> {
        let department_id = active_department(&self.store)?;
        let draft = NewTeamMember::new(department_id, name, designation);
        MemberContract.validate(&draft)?;

        let inserted = self
            .gateway
            .insert(Table::TeamMembers, vec![encode_row(&draft)?])
            .await?;
        let member: TeamMember = decode_one(Table::TeamMembers, inserted)?;

        self.store.write().apply_local(
            ChangeKind::Insert,
            Record::TeamMember(member.clone()),
            self.clock.today(),
        )?;
        info!(department_id, id = member.id, "added team member");
        Ok(member)
    }

    async fn try_delete(&self, id: Id) -> TdResult<()> {
        self.gateway.delete(Table::TeamMembers, id).await?;
        self.store.write().apply_change(
            EntityKind::TeamMember,
            ChangeKind::Delete,
            Record::Key(EntityKind::TeamMember, id),
        )?;
        Ok(())
    }
}
