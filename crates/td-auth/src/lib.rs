//! # td-auth
//!
//! Who is signed in, and which of their teams is active.
//!
//! - `identity` - Identity collaborator trait and in-memory implementation
//! - `preference` - The persisted active-team slot
//! - `context` - Team context state machine
//! - `session` - Sign-in, sign-up and sign-out flows tying the above together

pub mod identity;
pub mod preference;
pub mod context;
pub mod session;

pub use identity::{AuthEvent, Identity, MemoryIdentity, Session};
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore};
pub use context::{ContextState, LoadTicket, TeamContext};
pub use session::{SessionManager, TeamEntry};
