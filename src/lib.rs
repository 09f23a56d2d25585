pub mod board;
pub mod client;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod drag;
pub mod grid;
pub mod model;
#[cfg(feature = "tui")]
pub mod tui;
