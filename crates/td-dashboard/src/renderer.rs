//! Rendering collaborator

use parking_lot::Mutex;
use serde::Serialize;
use td_auth::ContextState;
use td_models::DepartmentMembership;
use td_queries::{DerivedViews, TaskQuery, ViewTab};
use tracing::{info, warn};

/// Everything the renderer needs for one paint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub state: ContextState,
    pub teams: Vec<DepartmentMembership>,
    pub tab: ViewTab,
    pub query: TaskQuery,
    pub views: DerivedViews,
}

pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame);

    /// Show a failure message
    fn show_error(&self, message: &str);
}

/// Writes a one-line digest of each frame to the log
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, frame: &Frame) {
        let summary = &frame.views.summary;
        info!(
            state = ?frame.state,
            tab = frame.tab.as_str(),
            total = summary.total,
            pending = summary.pending,
            in_progress = summary.in_progress,
            overdue = summary.overdue,
            "render"
        );
    }

    fn show_error(&self, message: &str) {
        warn!(message, "error shown");
    }
}

/// Keeps every frame and message, for tests
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<Frame>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.lock().last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, frame: &Frame) {
        self.frames.lock().push(frame.clone());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame() -> Frame {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        Frame {
            state: ContextState::AwaitingTeamSelection,
            teams: Vec::new(),
            tab: ViewTab::Calendar,
            query: TaskQuery::default(),
            views: DerivedViews::empty(today),
        }
    }

    #[test]
    fn test_recording_renderer_keeps_everything() {
        let renderer = RecordingRenderer::new();
        renderer.render(&frame());
        renderer.show_error("Invalid Team Code");
        LogRenderer.render(&frame());

        assert_eq!(renderer.frames().len(), 1);
        assert_eq!(renderer.last().unwrap().tab, ViewTab::Calendar);
        assert_eq!(renderer.errors(), vec!["Invalid Team Code".to_string()]);
    }

    #[test]
    fn test_frame_serializes_for_external_renderers() {
        let value = serde_json::to_value(frame()).unwrap();
        assert_eq!(value["state"], "AwaitingTeamSelection");
        assert_eq!(value["tab"], "calendar");
        assert_eq!(value["views"]["summary"]["total"], 0);
    }
}
