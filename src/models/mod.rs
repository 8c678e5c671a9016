pub mod api;
pub mod board;
pub mod filter;
pub mod task;
