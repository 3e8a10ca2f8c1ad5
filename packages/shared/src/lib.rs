//! Shared utilities for the Maeum server and client.

pub mod logger;
pub mod time;
