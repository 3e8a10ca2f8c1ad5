//! Terminal client for the Maeum chat relay.
//!
//! Requests an anonymous identity, gets matched with a partner (or joins
//! the room given on the command line) and relays lines typed at the
//! prompt over WebSocket.

pub mod args;
pub mod command;
pub mod error;
pub mod render;
pub mod session;

pub use args::ClientArgs;
pub use error::ClientError;
pub use session::run;
