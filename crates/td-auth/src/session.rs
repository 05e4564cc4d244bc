//! Session flows
//!
//! Ties the identity collaborator, the user's memberships and the team
//! context together. The context lock is never held across an await.

use parking_lot::Mutex;
use std::sync::Arc;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::Id;
use td_core::types::EntityKind;
use td_models::{DepartmentMembership, User};
use td_services::{
    Contract, JoinedTeam, ServiceResult, SignUpContract, SignUpRequest, TeamChoice, TeamService,
};
use td_store::{load_memberships, Record, SharedStore, TableGateway};
use tracing::{error, info, warn};

use crate::context::{ContextState, LoadTicket, TeamContext};
use crate::identity::Identity;
use crate::preference::PreferenceStore;

/// A team the user just joined or created, and the load to run for it
#[derive(Debug, Clone, PartialEq)]
pub struct TeamEntry {
    pub joined: JoinedTeam,
    pub ticket: LoadTicket,
}

pub struct SessionManager {
    identity: Arc<dyn Identity>,
    gateway: Arc<dyn TableGateway>,
    store: SharedStore,
    teams: TeamService,
    context: Mutex<TeamContext>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn Identity>,
        gateway: Arc<dyn TableGateway>,
        store: SharedStore,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let teams = TeamService::new(gateway.clone(), store.clone());
        Self {
            identity,
            gateway,
            store,
            teams,
            context: Mutex::new(TeamContext::new(preferences)),
        }
    }

    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }

    pub fn state(&self) -> ContextState {
        self.context.lock().state()
    }

    pub fn active_team(&self) -> Option<Id> {
        self.context.lock().active_team()
    }

    pub fn memberships(&self) -> Vec<DepartmentMembership> {
        self.context.lock().memberships().to_vec()
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.context.lock().is_current(ticket)
    }

    /// Pick up an existing identity session, if any
    pub async fn restore(&self) -> TdResult<Option<LoadTicket>> {
        match self.identity.current_user().await {
            Some(user) => self.establish(&user).await,
            None => {
                self.context.lock().reset_session();
                Ok(None)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> TdResult<Option<LoadTicket>> {
        let session = self.identity.sign_in(email, password).await?;
        self.establish(&session.user).await
    }

    /// Register, then join or create the chosen team
    ///
    /// When the account was created but the team step failed, the user stays
    /// signed in and is left awaiting team selection.
    pub async fn sign_up(&self, request: SignUpRequest) -> ServiceResult<TeamEntry> {
        if let Err(errors) = SignUpContract.validate(&request) {
            return ServiceResult::failure(errors);
        }
        let user = match self.identity.sign_up(&request.email, &request.password).await {
            Ok(user) => user,
            Err(err) => return ServiceResult::from_error(err),
        };
        if let Err(err) = self.establish(&user).await {
            return ServiceResult::from_error(err);
        }

        let full_name = request.full_name.trim();
        match &request.team {
            TeamChoice::Join { code } => self.join_team(&user, full_name, code).await,
            TeamChoice::Create { team_name } => self.create_team(&user, full_name, team_name).await,
        }
    }

    /// Join another team by access code; it becomes the active team
    pub async fn join_team(&self, user: &User, full_name: &str, code: &str) -> ServiceResult<TeamEntry> {
        let joined = self.teams.join_team(user, full_name, code).await;
        self.enter(user, joined).await
    }

    /// Create a team; the user becomes its admin and it becomes active
    pub async fn create_team(
        &self,
        user: &User,
        full_name: &str,
        team_name: &str,
    ) -> ServiceResult<TeamEntry> {
        let joined = self.teams.create_team(user, full_name, team_name).await;
        self.enter(user, joined).await
    }

    pub fn switch_team(&self, team_id: Id) -> TdResult<LoadTicket> {
        self.context.lock().switch_team(team_id)
    }

    pub async fn sign_out(&self) -> TdResult<()> {
        self.end_session();
        self.identity.sign_out().await
    }

    async fn enter(&self, user: &User, joined: ServiceResult<JoinedTeam>) -> ServiceResult<TeamEntry> {
        let joined = match joined.into_td_result() {
            Ok(joined) => joined,
            Err(err) => return ServiceResult::from_error(err),
        };
        let memberships = match self.refresh_memberships(user).await {
            Ok(memberships) => memberships,
            Err(err) => return ServiceResult::from_error(err),
        };
        let ticket = self
            .context
            .lock()
            .joined(memberships, joined.department.id);
        match ticket {
            Ok(ticket) => ServiceResult::success(TeamEntry { joined, ticket }),
            Err(err) => ServiceResult::from_error(err),
        }
    }

    async fn establish(&self, user: &User) -> TdResult<Option<LoadTicket>> {
        let memberships = self.refresh_memberships(user).await?;
        let ticket = self.context.lock().establish(memberships);
        if ticket.is_none() {
            self.store.write().reset(None);
        }
        Ok(ticket)
    }

    /// Fetch the user's memberships and mirror them in the store
    ///
    /// Failure to fetch them at all ends the session.
    async fn refresh_memberships(&self, user: &User) -> TdResult<Vec<DepartmentMembership>> {
        let memberships = match load_memberships(self.gateway.as_ref(), user.id).await {
            Ok(memberships) => memberships,
            Err(err) => {
                error!(user_id = %user.id, error = %err, "could not load team memberships; signing out");
                self.end_session();
                if let Err(sign_out) = self.identity.sign_out().await {
                    warn!(error = %sign_out, "forced sign-out failed");
                }
                return Err(TdError::Catastrophic(format!(
                    "could not load your teams: {}",
                    err.user_message()
                )));
            }
        };

        self.store.write().load(
            EntityKind::Membership,
            memberships.iter().cloned().map(Record::from).collect(),
        )?;
        info!(user_id = %user.id, count = memberships.len(), "loaded memberships");
        Ok(memberships)
    }

    fn end_session(&self) {
        self.context.lock().sign_out();
        self.store.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentity;
    use crate::preference::MemoryPreferenceStore;
    use serde_json::json;
    use td_core::error::ErrorCategory;
    use td_core::types::Table;
    use td_services::INVALID_TEAM_CODE;
    use td_store::{EntityStore, MemoryGateway};

    struct Fixture {
        identity: Arc<MemoryIdentity>,
        gateway: Arc<MemoryGateway>,
        preferences: Arc<MemoryPreferenceStore>,
        store: SharedStore,
        session: SessionManager,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(MemoryIdentity::new());
        let gateway = Arc::new(MemoryGateway::new());
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let store = EntityStore::shared();
        let session = SessionManager::new(
            identity.clone(),
            gateway.clone(),
            store.clone(),
            preferences.clone(),
        );
        Fixture {
            identity,
            gateway,
            preferences,
            store,
            session,
        }
    }

    fn sign_up_request(team: TeamChoice) -> SignUpRequest {
        SignUpRequest {
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            full_name: "Alice Smith".to_string(),
            team,
        }
    }

    #[tokio::test]
    async fn test_sign_up_creating_a_team() {
        let f = fixture();
        let entry = f
            .session
            .sign_up(sign_up_request(TeamChoice::Create {
                team_name: "Engineering".to_string(),
            }))
            .await
            .into_result()
            .unwrap();

        assert!(entry.joined.department.access_code.starts_with("ENG-"));
        assert_eq!(f.session.state(), ContextState::Active(entry.joined.department.id));
        assert!(f.session.is_current(&entry.ticket));
        assert_eq!(f.session.memberships().len(), 1);
        assert_eq!(f.store.read().memberships().len(), 1);
        assert_eq!(f.preferences.load_active_team().unwrap(), Some(entry.joined.department.id));
    }

    #[tokio::test]
    async fn test_sign_up_with_unknown_code() {
        let f = fixture();
        let result = f
            .session
            .sign_up(sign_up_request(TeamChoice::Join {
                code: "XYZ-0000".to_string(),
            }))
            .await;

        assert_eq!(result.full_messages(), vec![INVALID_TEAM_CODE.to_string()]);
        assert_eq!(f.session.state(), ContextState::AwaitingTeamSelection);
        assert!(f.identity.current_user().await.is_some());
    }

    #[tokio::test]
    async fn test_sign_up_form_is_checked_first() {
        let f = fixture();
        let mut request = sign_up_request(TeamChoice::Create {
            team_name: " ".to_string(),
        });
        request.full_name = String::new();

        let result = f.session.sign_up(request).await;
        assert_eq!(result.category(), Some(ErrorCategory::Validation));
        assert_eq!(f.identity.current_user().await, None);
    }

    #[tokio::test]
    async fn test_sign_in_restores_persisted_team() {
        let f = fixture();
        let user = f.identity.sign_up("alice@example.com", "secret1").await.unwrap();
        f.gateway.seed(
            Table::Departments,
            vec![
                json!({"id": 10, "name": "Engineering", "access_code": "ENG-1111"}),
                json!({"id": 20, "name": "Design", "access_code": "DES-2222"}),
            ],
        );
        f.gateway.seed(
            Table::DepartmentMemberships,
            vec![
                json!({"id": 1, "user_id": user.id, "department_id": 10, "role": "Admin"}),
                json!({"id": 2, "user_id": user.id, "department_id": 20, "role": "Member"}),
            ],
        );
        f.preferences.save_active_team(20).unwrap();

        let ticket = f
            .session
            .sign_in("alice@example.com", "secret1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.team_id, 20);
        let names: Vec<Option<String>> = f
            .session
            .memberships()
            .into_iter()
            .map(|m| m.department_name)
            .collect();
        assert_eq!(
            names,
            vec![Some("Engineering".to_string()), Some("Design".to_string())]
        );
    }

    #[tokio::test]
    async fn test_membership_failure_forces_sign_out() {
        let f = fixture();
        f.identity.sign_up("alice@example.com", "secret1").await.unwrap();
        f.gateway.fail(Table::DepartmentMemberships, "connection refused");

        let err = f.session.restore().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Catastrophic);
        assert_eq!(f.session.state(), ContextState::NoSession);
        assert_eq!(f.identity.current_user().await, None);
    }

    #[tokio::test]
    async fn test_sign_out_clears_preference_and_store() {
        let f = fixture();
        f.session
            .sign_up(sign_up_request(TeamChoice::Create {
                team_name: "Engineering".to_string(),
            }))
            .await
            .into_result()
            .unwrap();

        f.session.sign_out().await.unwrap();
        assert_eq!(f.session.state(), ContextState::NoSession);
        assert_eq!(f.preferences.load_active_team().unwrap(), None);
        assert!(f.store.read().memberships().is_empty());
        assert_eq!(f.identity.current_user().await, None);
    }

    #[tokio::test]
    async fn test_restore_without_session() {
        let f = fixture();
        assert_eq!(f.session.restore().await.unwrap(), None);
        assert_eq!(f.session.state(), ContextState::NoSession);
    }

    #[tokio::test]
    async fn test_expired_session_keeps_persisted_team() {
        let f = fixture();
        let user = f.identity.sign_up("alice@example.com", "secret1").await.unwrap();
        f.identity.sign_out().await.unwrap();
        f.gateway.seed(
            Table::Departments,
            vec![
                json!({"id": 10, "name": "Engineering", "access_code": "ENG-1111"}),
                json!({"id": 20, "name": "Design", "access_code": "DES-2222"}),
            ],
        );
        f.gateway.seed(
            Table::DepartmentMemberships,
            vec![
                json!({"id": 1, "user_id": user.id, "department_id": 10, "role": "Admin"}),
                json!({"id": 2, "user_id": user.id, "department_id": 20, "role": "Member"}),
            ],
        );
        f.preferences.save_active_team(20).unwrap();

        assert_eq!(f.session.restore().await.unwrap(), None);
        assert_eq!(f.preferences.load_active_team().unwrap(), Some(20));

        let ticket = f
            .session
            .sign_in("alice@example.com", "secret1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.team_id, 20);
    }
}
