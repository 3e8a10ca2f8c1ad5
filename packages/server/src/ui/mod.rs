//! HTTP and WebSocket server.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_app, build_state, run};
