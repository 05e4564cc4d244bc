//! Dashboard controller
//!
//! Owns the view state for one client session. Mutations mark the entity
//! store dirty; [`Dashboard::flush`] recomputes the derived views once and
//! renders, however many changes arrived since the previous flush.
//!
//! While a team load is in flight renders are held back, so a frame never
//! mixes rows of the previous team with the next one. Each load is tagged
//! with the ticket it was issued for and dropped on arrival when a newer
//! switch has started since.

use parking_lot::Mutex;
use std::sync::Arc;
use td_auth::{LoadTicket, SessionManager, TeamEntry};
use td_core::config::DashboardConfig;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_core::traits::{Clock, Id};
use td_queries::{DerivedViews, FilterSpec, TaskQuery, ViewTab};
use td_services::{
    MemberService, ProjectService, ServiceResult, SignUpRequest, TaskDraft, TaskService,
};
use td_store::{load_team_snapshot, SharedStore, TableGateway};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::actions::UserAction;
use crate::renderer::{Frame, Renderer};

struct ViewState {
    query: TaskQuery,
    tab: ViewTab,
    views: DerivedViews,
    /// Team load in flight
    switching: Option<LoadTicket>,
    /// A render is due even if the store is clean
    stale: bool,
}

pub struct Dashboard {
    clock: Arc<dyn Clock>,
    store: SharedStore,
    gateway: Arc<dyn TableGateway>,
    session: Arc<SessionManager>,
    tasks: TaskService,
    members: MemberService,
    projects: ProjectService,
    renderer: Arc<dyn Renderer>,
    view: Mutex<ViewState>,
}

impl Dashboard {
    pub fn new(
        session: Arc<SessionManager>,
        gateway: Arc<dyn TableGateway>,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn Renderer>,
        config: &DashboardConfig,
    ) -> TdResult<Self> {
        let today = clock.today();
        let query = TaskQuery::from_config(config, today)?;
        let tasks = TaskService::new(gateway.clone(), store.clone(), clock.clone())
            .with_promise_offset(config.default_promise_offset_days);
        let members = MemberService::new(gateway.clone(), store.clone(), clock.clone());
        let projects = ProjectService::new(gateway.clone(), store.clone(), clock.clone());

        Ok(Self {
            clock,
            store,
            gateway,
            session,
            tasks,
            members,
            projects,
            renderer,
            view: Mutex::new(ViewState {
                query,
                tab: ViewTab::default(),
                views: DerivedViews::empty(today),
                switching: None,
                stale: true,
            }),
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn query(&self) -> TaskQuery {
        self.view.lock().query.clone()
    }

    pub fn tab(&self) -> ViewTab {
        self.view.lock().tab
    }

    /// Views as of the last flush
    pub fn views(&self) -> DerivedViews {
        self.view.lock().views.clone()
    }

    pub fn is_switching(&self) -> bool {
        self.view.lock().switching.is_some()
    }

    /// Pre-filled new-task form
    pub fn task_draft(&self) -> TaskDraft {
        self.tasks.draft()
    }

    /// Restore an existing session and load its active team
    pub async fn start(&self) -> TdResult<()> {
        match self.session.restore().await {
            Ok(Some(ticket)) => self.load_team(ticket).await.map(|_| ()),
            Ok(None) => {
                self.mark_stale();
                self.flush();
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> TdResult<()> {
        match self.session.sign_in(email, password).await {
            Ok(Some(ticket)) => self.load_team(ticket).await.map(|_| ()),
            Ok(None) => {
                self.mark_stale();
                self.flush();
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> ServiceResult<TeamEntry> {
        let result = self.session.sign_up(request).await;
        self.enter(result).await
    }

    /// Join another team by access code
    pub async fn join_team(&self, full_name: &str, code: &str) -> ServiceResult<TeamEntry> {
        let Some(user) = self.session.identity().current_user().await else {
            return ServiceResult::from_error(self.fail(TdError::Consistency("no session".to_string())));
        };
        let result = self.session.join_team(&user, full_name, code).await;
        self.enter(result).await
    }

    pub async fn create_team(&self, full_name: &str, team_name: &str) -> ServiceResult<TeamEntry> {
        let Some(user) = self.session.identity().current_user().await else {
            return ServiceResult::from_error(self.fail(TdError::Consistency("no session".to_string())));
        };
        let result = self.session.create_team(&user, full_name, team_name).await;
        self.enter(result).await
    }

    pub async fn sign_out(&self) -> TdResult<()> {
        let result = self.session.sign_out().await;
        {
            let mut view = self.view.lock();
            view.switching = None;
            view.stale = true;
        }
        self.flush();
        result
    }

    /// Switch the active team and load it
    ///
    /// Returns false when the load was superseded by a newer switch.
    pub async fn switch_team(&self, team_id: Id) -> TdResult<bool> {
        let ticket = self.session.switch_team(team_id).map_err(|e| self.fail(e))?;
        self.load_team(ticket).await
    }

    /// Apply one user action, then flush
    pub async fn dispatch(&self, action: UserAction) -> ServiceResult<()> {
        debug!(action = action.name(), mutation = action.is_mutation(), "dispatch");
        let result: ServiceResult<()> = match action {
            UserAction::AddTask(draft) => self.tasks.create(draft).await.map(|_| ()),
            UserAction::EditTask { id, edit } => self.tasks.update(id, edit).await.map(|_| ()),
            UserAction::DeleteTask(id) => self.tasks.delete(id).await,
            UserAction::AddMember { name, designation } => {
                self.members.add(&name, &designation).await.map(|_| ())
            }
            UserAction::DeleteMember(id) => self.members.delete(id).await,
            UserAction::AddProject { name } => self.projects.add(&name).await.map(|_| ()),
            UserAction::DeleteProject(id) => self.projects.delete(id).await,
            UserAction::SetFilter { field, value } => self
                .update_query(|query| query.filter.set(field, &value))
                .into(),
            UserAction::ClearFilters => self
                .update_query(|query| {
                    query.filter = FilterSpec::default();
                    Ok(())
                })
                .into(),
            UserAction::SortBy(key) => self
                .update_query(|query| {
                    query.sort.toggle(key);
                    Ok(())
                })
                .into(),
            UserAction::SwitchTeam(team_id) => {
                return self.switch_team(team_id).await.map(|_| ()).into();
            }
            UserAction::SwitchTab(tab) => {
                let mut view = self.view.lock();
                view.tab = tab;
                view.stale = true;
                ServiceResult::success(())
            }
        };

        if result.is_failure() {
            self.renderer.show_error(&result.full_messages().join("\n"));
        }
        self.flush();
        result
    }

    /// Recompute and render if anything changed since the last flush
    ///
    /// Returns whether a frame was rendered.
    pub fn flush(&self) -> bool {
        let frame = {
            let mut view = self.view.lock();
            if let Some(ticket) = view.switching {
                debug!(team_id = ticket.team_id, "render held back during team load");
                return false;
            }
            let dirty = self.store.write().take_dirty();
            if !dirty && !view.stale {
                return false;
            }
            view.stale = false;

            let today = self.clock.today();
            let views = {
                let store = self.store.read();
                DerivedViews::build(store.tasks(), store.members(), store.projects(), &view.query, today)
            };
            view.views = views;
            Frame {
                state: self.session.state(),
                teams: self.session.memberships(),
                tab: view.tab,
                query: view.query.clone(),
                views: view.views.clone(),
            }
        };

        self.renderer.render(&frame);
        true
    }

    /// Flush on every change the realtime channel reports
    pub fn watch_realtime(self: &Arc<Self>, mut changes: watch::Receiver<u64>) -> JoinHandle<()> {
        let dashboard = Arc::clone(self);
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                dashboard.flush();
            }
            debug!("realtime change stream ended");
        })
    }

    async fn enter(&self, result: ServiceResult<TeamEntry>) -> ServiceResult<TeamEntry> {
        match result.result().map(|entry| entry.ticket) {
            Some(ticket) => {
                if let Err(err) = self.load_team(ticket).await {
                    return ServiceResult::from_error(err);
                }
            }
            None => {
                self.renderer.show_error(&result.full_messages().join("\n"));
                self.mark_stale();
                self.flush();
            }
        }
        result
    }

    async fn load_team(&self, ticket: LoadTicket) -> TdResult<bool> {
        self.view.lock().switching = Some(ticket);
        self.store.write().begin_load(ticket.team_id);
        info!(team_id = ticket.team_id, epoch = ticket.epoch, "loading team");

        let loaded = load_team_snapshot(self.gateway.as_ref(), ticket.team_id).await;

        let outcome = {
            let mut store = self.store.write();
            if !self.session.is_current(&ticket) || store.department_id() != Some(ticket.team_id) {
                None
            } else {
                Some(match loaded {
                    Ok(snapshot) => {
                        store.install(snapshot);
                        Ok(true)
                    }
                    Err(err) => {
                        store.cancel_load();
                        Err(err)
                    }
                })
            }
        };

        let mut view = self.view.lock();
        if view.switching == Some(ticket) {
            view.switching = None;
        }
        let Some(outcome) = outcome else {
            warn!(
                team_id = ticket.team_id,
                epoch = ticket.epoch,
                "discarding load for a team that is no longer active"
            );
            return Ok(false);
        };
        view.stale = true;
        drop(view);

        if let Err(err) = &outcome {
            error!(team_id = ticket.team_id, error = %err, "team load failed");
            self.renderer.show_error(&err.user_message());
        }
        self.flush();
        outcome
    }

    fn update_query(&self, change: impl FnOnce(&mut TaskQuery) -> TdResult<()>) -> TdResult<()> {
        let mut view = self.view.lock();
        let mut query = view.query.clone();
        change(&mut query)?;
        if query != view.query {
            view.query = query;
            view.stale = true;
        }
        Ok(())
    }

    fn mark_stale(&self) {
        self.view.lock().stale = true;
    }

    /// Surface an error that ends a flow
    fn fail(&self, err: TdError) -> TdError {
        warn!(error = %err, category = ?err.category(), "flow failed");
        self.renderer.show_error(&err.user_message());
        self.mark_stale();
        self.flush();
        err
    }
}
