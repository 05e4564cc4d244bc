//! Task priority
//!
//! Table column: tasks.priority (nullable text; absent reads as Medium)

use serde::{Deserialize, Serialize};
use std::fmt;
use td_core::types::Color;

/// Task priority, declared in ascending urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Parse from the stored label
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            "Urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    /// Badge and chart color
    pub fn color(&self) -> Color {
        match self {
            Self::Low => Color::with_name("#6B7280", "gray"),
            Self::Medium => Color::with_name("#3B82F6", "blue"),
            Self::High => Color::with_name("#F97316", "orange"),
            Self::Urgent => Color::with_name("#EF4444", "red"),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
