//! Core traits shared by models, the entity store, and the services

use chrono::{Local, NaiveDate};

use crate::types::{EntityKind, Table};

/// Primary key type for rows in the relational store
pub type Id = i64;

/// Trait for rows that carry a server-assigned primary key
pub trait Identifiable {
    fn id(&self) -> Id;
}

/// Trait for rows that belong to exactly one department (team)
pub trait DepartmentScoped {
    fn department_id(&self) -> Id;
}

/// Base trait for all entities mirrored by the client
pub trait Entity: Identifiable + Clone + Send + Sync {
    /// The table the entity is stored in
    const TABLE: Table;

    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;

    /// The entity kind inside the local mirror, if it is mirrored at all
    fn kind() -> Option<EntityKind> {
        Self::TABLE.entity_kind()
    }
}

/// Source of the current calendar date
///
/// Overdue checks, completion stamps, and default filters all read the
/// date through this trait so that they can be pinned in tests.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the local system date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// Build from year, month, day; falls back to `NaiveDate::MIN` on invalid input
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
