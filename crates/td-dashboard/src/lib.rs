//! # td-dashboard
//!
//! The root controller. It owns the entity store, the task query and the
//! current views, applies user actions through the services, and hands a
//! fresh [`Frame`] to the renderer whenever the store or the query changed.
//!
//! - `dashboard` - The controller
//! - `actions` - User actions coming back from the renderer
//! - `renderer` - Rendering collaborator
//! - `bootstrap` - Wiring from configuration
//! - `telemetry` - Tracing setup

pub mod actions;
pub mod bootstrap;
pub mod dashboard;
pub mod renderer;
pub mod telemetry;

pub use actions::UserAction;
pub use bootstrap::App;
pub use dashboard::Dashboard;
pub use renderer::{Frame, LogRenderer, RecordingRenderer, Renderer};
