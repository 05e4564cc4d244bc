//! Project services
//!
//! Project names are unique within a team, compared case-insensitively.
//! Tasks keep their free-text project name when a project is deleted.

use std::sync::Arc;
use td_core::result::TdResult;
use td_core::traits::{Clock, Id};
use td_core::types::{ChangeKind, EntityKind, Table};
use td_models::{NewProject, Project};
use td_store::{Record, SharedStore, TableGateway};
use tracing::info;

use crate::contracts::{Contract, ProjectContract};
use crate::result::ServiceResult;
use crate::support::{active_department, decode_one, encode_row};

#[derive(Clone)]
pub struct ProjectService {
    gateway: Arc<dyn TableGateway>,
    store: SharedStore,
    clock: Arc<dyn Clock>,
}

impl ProjectService {
    pub fn new(gateway: Arc<dyn TableGateway>, store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            store,
            clock,
        }
    }

    pub async fn add(&self, name: &str) -> ServiceResult<Project> {
        self.try_add(name).await.into()
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        self.try_delete(id).await.into()
    }

    async fn try_add(&self, name: &str) -> TdResult<Project> {
        let department_id = active_department(&self.store)?;
        let draft = NewProject::new(department_id, name);
        {
            let store = self.store.read();
            ProjectContract {
                existing: store.projects(),
            }
            .validate(&draft)?;
        }

        let inserted = self
            .gateway
            .insert(Table::Projects, vec![encode_row(&draft)?])
            .await?;
        let project: Project = decode_one(Table::Projects, inserted)?;

        self.store.write().apply_local(
            ChangeKind::Insert,
            Record::Project(project.clone()),
            self.clock.today(),
        )?;
        info!(department_id, name = %project.name, "added project");
        Ok(project)
    }

    async fn try_delete(&self, id: Id) -> TdResult<()> {
        self.gateway.delete(Table::Projects, id).await?;
        self.store.write().apply_change(
            EntityKind::Project,
            ChangeKind::Delete,
            Record::Key(EntityKind::Project, id),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{clock, memory_gateway, store};

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let gateway = memory_gateway();
        let store = store();
        let service = ProjectService::new(gateway.clone(), store.clone(), clock());

        let website = service.add("Website").await.into_result().unwrap();
        assert_eq!(website.name, "Website");

        let duplicate = service.add(" WEBSITE ").await;
        assert_eq!(
            duplicate.errors().get("name"),
            Some(&vec!["has already been taken".to_string()])
        );
        assert_eq!(gateway.rows(Table::Projects).len(), 1);
        assert_eq!(store.read().projects().len(), 1);
    }

    #[tokio::test]
    async fn test_name_is_free_again_after_delete() {
        let store = store();
        let service = ProjectService::new(memory_gateway(), store.clone(), clock());
        let project = service.add("Website").await.into_result().unwrap();

        assert!(service.delete(project.id).await.is_success());
        assert!(store.read().projects().is_empty());
        assert!(service.add("Website").await.is_success());
    }
}
