//! # td-store
//!
//! The local mirror of the active team's rows, and the persistence
//! collaborator it is filled from.
//!
//! - `record` - Typed rows crossing the store boundary
//! - `store` - The entity store: bulk loads, idempotent change application
//! - `change` - Row-level change events
//! - `gateway` - Persistence collaborator trait and in-memory implementation
//! - `loader` - Team snapshot loading

pub mod record;
pub mod store;
pub mod change;
pub mod gateway;
pub mod loader;

pub use record::Record;
pub use store::{Applied, EntityStore, SharedStore};
pub use change::ChangeEvent;
pub use gateway::{MemoryGateway, RowFilter, TableGateway};
pub use loader::{load_memberships, load_team_snapshot, TeamSnapshot};
