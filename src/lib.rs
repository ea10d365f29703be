pub mod client;
pub mod config;
pub mod health;
pub mod notify;
pub mod state;
pub mod transport;
pub mod tui;
