pub mod board;
pub mod health;

pub use board::{board_config, BoardSession};
pub use health::health_config;
