//! Team context
//!
//! Tracks which of the user's teams is active. Every move to a team hands
//! out a [`LoadTicket`]; a load issued for a ticket may only be installed
//! while that ticket is still current, so results for a team the user has
//! already switched away from are discarded.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::Id;
use td_models::DepartmentMembership;
use tracing::{info, warn};

use crate::preference::PreferenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextState {
    NoSession,
    /// Signed in without any membership; the user must join or create a team
    AwaitingTeamSelection,
    Active(Id),
}

/// Tag for a team load in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket {
    pub team_id: Id,
    pub epoch: u64,
}

pub struct TeamContext {
    state: ContextState,
    memberships: Vec<DepartmentMembership>,
    epoch: u64,
    preferences: Arc<dyn PreferenceStore>,
}

impl TeamContext {
    pub fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            state: ContextState::NoSession,
            memberships: Vec::new(),
            epoch: 0,
            preferences,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn active_team(&self) -> Option<Id> {
        match self.state {
            ContextState::Active(team_id) => Some(team_id),
            _ => None,
        }
    }

    pub fn memberships(&self) -> &[DepartmentMembership] {
        &self.memberships
    }

    pub fn membership(&self, team_id: Id) -> Option<&DepartmentMembership> {
        self.memberships.iter().find(|m| m.department_id == team_id)
    }

    /// A session was established with these memberships
    ///
    /// Restores the persisted team when it is still one of the memberships,
    /// otherwise falls back to the first one. Without memberships the user
    /// is routed to team selection and no ticket is issued.
    pub fn establish(&mut self, memberships: Vec<DepartmentMembership>) -> Option<LoadTicket> {
        self.memberships = memberships;
        let Some(first) = self.memberships.first().map(|m| m.department_id) else {
            info!("signed in without a team; awaiting team selection");
            self.state = ContextState::AwaitingTeamSelection;
            self.epoch += 1;
            return None;
        };

        let persisted = match self.preferences.load_active_team() {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(error = %err, "could not read the active team preference");
                None
            }
        };
        let team_id = match persisted {
            Some(team_id) if self.membership(team_id).is_some() => team_id,
            Some(team_id) => {
                info!(team_id, "persisted team is no longer a membership");
                first
            }
            None => first,
        };
        Some(self.activate(team_id))
    }

    /// Explicit switch to another of the user's teams
    pub fn switch_team(&mut self, team_id: Id) -> TdResult<LoadTicket> {
        if self.state == ContextState::NoSession {
            return Err(TdError::Consistency("no session".to_string()));
        }
        if self.membership(team_id).is_none() {
            return Err(TdError::Forbidden {
                message: format!("not a member of team {}", team_id),
            });
        }

        if let Err(err) = self.preferences.save_active_team(team_id) {
            warn!(team_id, error = %err, "could not persist the active team");
        }
        Ok(self.activate(team_id))
    }

    /// The user joined or created `team_id`; it becomes active
    pub fn joined(
        &mut self,
        memberships: Vec<DepartmentMembership>,
        team_id: Id,
    ) -> TdResult<LoadTicket> {
        self.memberships = memberships;
        if self.state == ContextState::NoSession {
            self.state = ContextState::AwaitingTeamSelection;
        }
        self.switch_team(team_id)
    }

    /// No session is present; the persisted team is kept for the next sign-in
    pub fn reset_session(&mut self) {
        info!("team context cleared");
        self.state = ContextState::NoSession;
        self.memberships.clear();
        self.epoch += 1;
    }

    /// The user signed out; the persisted team is forgotten as well
    pub fn sign_out(&mut self) {
        self.reset_session();
        if let Err(err) = self.preferences.clear() {
            warn!(error = %err, "could not clear the active team preference");
        }
    }

    /// Whether a load issued for `ticket` may still be installed
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.epoch == ticket.epoch && self.state == ContextState::Active(ticket.team_id)
    }

    fn activate(&mut self, team_id: Id) -> LoadTicket {
        self.epoch += 1;
        self.state = ContextState::Active(team_id);
        info!(team_id, epoch = self.epoch, "team activated");
        LoadTicket {
            team_id,
            epoch: self.epoch,
        }
    }
}
