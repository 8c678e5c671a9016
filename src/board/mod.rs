//! Board Synchronization Engine.
//!
//! [`store::ColumnStore`] holds the columns, [`coordinator::MutationCoordinator`]
//! applies optimistic changes and talks to the remote Task API, and
//! [`dnd::DragDropAdapter`] feeds it drag gestures.

pub mod coordinator;
pub mod dnd;
pub mod notify;
pub mod store;

pub use coordinator::{FailurePolicy, MutationCoordinator, MutationOutcome, ReloadSummary};
pub use dnd::{DragDropAdapter, DragItem, DropTarget};
pub use notify::{LogNotifier, Notice, NoticeLevel, NoticeQueue, Notifier};
pub use store::{BoardAction, Column, ColumnStore, Snapshot};
