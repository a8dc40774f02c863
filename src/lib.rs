//! # Nexus Core
//!
//! Domain models, board state and remote synchronization for the Nexus
//! CRM and task tracker.
//!
//! The crate holds the deal pipeline board (a per-stage ordered index with
//! move and reorder operations), the task store (status, checklist and due
//! date mutations) and the sync layer that pushes those mutations to a
//! hosted document store without blocking the caller. Rendering lives
//! elsewhere: views subscribe to store snapshots and call the mutation
//! methods in response to user input.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod remote;
pub mod sample;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use domain::{
    board::StageOrder,
    client::{Client, ClientId, ClientStatus},
    deal::{Deal, DealId, DealStage},
    drag::{resolve_drag, BoardMove, DragEnd, DropTarget},
    project::{Project, ProjectId, ProjectStatus, TeamMember},
    task::{ChecklistItem, Task, TaskId, TaskPriority, TaskStatus},
};
pub use error::{NexusError, Result};
pub use remote::{Collection, DataSource, RemoteBackend, RemoteSync, Subscription, TasksPayload};
pub use storage::LocalCache;
pub use store::{DealStore, SyncHandle, TaskStore};
