//! Observable application state.
//!
//! Each store keeps its state in a `tokio::sync::watch` channel as an
//! `Arc` snapshot. Mutations copy on write through `Arc::make_mut`, so
//! readers holding an older snapshot never see it change and a mutation
//! that changes nothing keeps the same `Arc`.

pub mod deal_store;
pub mod sync_worker;
pub mod task_store;

pub use deal_store::{DealBoardState, DealStore};
pub use sync_worker::SyncHandle;
pub use task_store::{TaskStore, TasksState};
