//! Taskdesk demo
//!
//! Runs the dashboard core over in-memory collaborators: signs up a demo
//! user, creates a team, adds a few tasks and logs every rendered frame.

use std::sync::Arc;

use td_dashboard::{telemetry, App, LogRenderer, UserAction};
use td_models::{Priority, TaskStatus};
use td_queries::{SortKey, ViewTab};
use td_services::{SignUpRequest, TaskEdit, TeamChoice};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = App::load_config()?;
    telemetry::init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        realtime = config.realtime.enabled,
        "Starting Taskdesk"
    );

    let mut app = App::in_memory(config, Arc::new(LogRenderer))?;
    app.start_realtime();
    let dashboard = app.dashboard.clone();

    dashboard.start().await?;
    let entry = dashboard
        .sign_up(SignUpRequest {
            email: "demo@taskdesk.local".to_string(),
            password: "taskdesk".to_string(),
            full_name: "Demo User".to_string(),
            team: TeamChoice::Create {
                team_name: "Demo Team".to_string(),
            },
        })
        .await
        .into_td_result()?;
    info!(
        team = %entry.joined.department.name,
        access_code = %entry.joined.department.access_code,
        "demo team ready"
    );

    let actions = vec![
        UserAction::AddMember {
            name: "Sam Lee".to_string(),
            designation: "Designer".to_string(),
        },
        UserAction::AddProject {
            name: "Website".to_string(),
        },
    ];
    for action in actions {
        dashboard.dispatch(action).await.into_td_result()?;
    }

    let mut draft = dashboard.task_draft();
    draft.description = "Draft launch checklist".to_string();
    draft.project = Some("Website".to_string());
    draft.owners = vec!["Demo User".to_string(), "Sam Lee".to_string()];
    draft.priority = Priority::High;
    dashboard.dispatch(UserAction::AddTask(draft)).await.into_td_result()?;

    let first = dashboard.views().tasks.first().map(|task| task.id);
    if let Some(id) = first {
        dashboard
            .dispatch(UserAction::EditTask {
                id,
                edit: TaskEdit::status(TaskStatus::Done),
            })
            .await
            .into_td_result()?;
    }

    dashboard.dispatch(UserAction::SortBy(SortKey::Owner)).await.into_td_result()?;
    dashboard
        .dispatch(UserAction::SwitchTab(ViewTab::Dashboard))
        .await
        .into_td_result()?;

    let views = dashboard.views();
    info!(
        total = views.summary.total,
        owners = views.owner_tally.entries().len(),
        "demo finished"
    );

    dashboard.sign_out().await?;
    app.shutdown().await
}
