/// Declares a string-backed record identifier.
///
/// Record ids double as document ids in the remote store, so they must be
/// non-empty and may not contain a path separator.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id without validation
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::NexusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.contains('/') {
                    return Err(crate::error::NexusError::InvalidRecordId(s.to_string()));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

pub mod board;
pub mod calendar;
pub mod client;
pub mod deal;
pub mod drag;
pub mod filter;
pub mod project;
pub mod sorting;
pub mod task;

pub use board::{dedupe_deals, StageOrder};
pub use calendar::{month_grid, CalendarDay, CalendarStats, DayCell};
pub use client::{Client, ClientId, ClientStatus};
pub use deal::{Deal, DealId, DealStage};
pub use drag::{resolve_drag, BoardMove, DragEnd, DropTarget};
pub use filter::{DealQuery, PipelineTotals, TaskQuery, TaskStats};
pub use project::{Project, ProjectId, ProjectStatus, TeamMember};
pub use sorting::{sort_tasks, SortField, SortOrder};
pub use task::{ChecklistItem, Task, TaskId, TaskPriority, TaskStatus};
