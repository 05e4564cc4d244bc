//! # td-queries
//!
//! Filter/sort engine and derived views for Taskdesk.
//!
//! Everything in this crate is a pure function of a task snapshot and the
//! current date. Nothing here touches the entity store directly.
//!
//! ## Structure
//!
//! - `filters` - Filter spec and the overdue predicate
//! - `sorts` - Sort keys, directions and the stable task sort
//! - `query` - Filter + sort applied together, view tabs
//! - `summary` - Summary card counts
//! - `tally` - Status, priority and owner tallies
//! - `grouping` - Project → assigned date grouping
//! - `calendar` - Calendar event projection
//! - `duration` - Promise difference and days taken
//! - `roster` - Sorted member/project lists and filter options
//! - `views` - All projections bundled for one recompute
//!
//! ## Example
//!
//! ```
//! use td_queries::{FilterSpec, SortKey, SortSpec, TaskQuery};
//!
//! let mut query = TaskQuery::new(FilterSpec::default(), SortSpec::default());
//! query.sort.toggle(SortKey::PromiseDate);
//! assert!(query.filter.is_unfiltered());
//! ```

pub mod filters;
pub mod sorts;
pub mod query;
pub mod summary;
pub mod tally;
pub mod grouping;
pub mod calendar;
pub mod duration;
pub mod roster;
pub mod views;

pub use filters::{is_overdue, FilterField, FilterSpec, Selection, StatusFilter};
pub use sorts::{SortDirection, SortKey, SortSpec};
pub use query::{TaskQuery, ViewTab};
pub use summary::Summary;
pub use tally::{OwnerTally, PriorityTally, StatusBucket, StatusTally, Tally};
pub use grouping::{DateGroup, ProjectGroup, ProjectGrouping, UNCATEGORIZED};
pub use calendar::CalendarEvent;
pub use duration::{days_taken, promise_difference};
pub use roster::{FilterOptions, Roster};
pub use views::DerivedViews;
