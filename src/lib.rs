//! Kanban board synchronization engine.
//!
//! Keeps a paginated, three-column task board consistent with a remote Task
//! API under drag-and-drop reordering, column moves and infinite scroll, and
//! serves it to a browser UI through a small actix-web bridge.

pub mod board;
pub mod client;
pub mod config;
pub mod demo;
pub mod handlers;
pub mod models;
pub mod utils;
