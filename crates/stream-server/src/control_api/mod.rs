//! HTTP Control API for the stream server
//!
//! Exposes per-stream AGC diagnostics, resets and live tuning, plus the chat history

pub mod routes;
pub mod server;
pub mod types;

pub use routes::{create_router, AppState};
pub use server::ControlServer;
pub use types::*;
